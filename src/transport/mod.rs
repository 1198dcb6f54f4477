//! # Printer Transport Layer
//!
//! Label printers are not driven directly. A local print-spooler bridge
//! discovers printers and forwards raw payloads to the OS print system;
//! this module talks to that bridge.
//!
//! ## Available Transports
//!
//! - [`websocket`]: JSON request/response over a local websocket
//!
//! ## Session
//!
//! [`PrintSession`] owns the connection status and the selected printer.
//! Connecting is one-shot: a failed attempt leaves the session
//! disconnected until the operator retries.
//!
//! ```text
//!  Disconnected ──connect()──► Connecting ──ok──► Connected
//!        ▲                          │
//!        └──────────── error ───────┘
//! ```

use async_trait::async_trait;

use crate::error::EtiquetaError;

pub mod session;
pub mod websocket;

pub use session::{BridgeStatus, PrintSession};
pub use websocket::{DEFAULT_BRIDGE_URL, WebSocketBridge};

/// A print-spooler bridge.
#[async_trait]
pub trait PrintBridge: Send + Sync {
    /// Open the connection. No retry on failure.
    async fn connect(&self) -> Result<(), EtiquetaError>;

    /// Whether the connection is currently open.
    async fn is_connected(&self) -> bool;

    /// Names of the printers the bridge can reach.
    async fn find_printers(&self) -> Result<Vec<String>, EtiquetaError>;

    /// Submit one raw text payload to `printer`.
    async fn submit_raw(&self, printer: &str, payload: &str) -> Result<(), EtiquetaError>;
}

#[async_trait]
impl<T: PrintBridge + ?Sized> PrintBridge for Box<T> {
    async fn connect(&self) -> Result<(), EtiquetaError> {
        (**self).connect().await
    }

    async fn is_connected(&self) -> bool {
        (**self).is_connected().await
    }

    async fn find_printers(&self) -> Result<Vec<String>, EtiquetaError> {
        (**self).find_printers().await
    }

    async fn submit_raw(&self, printer: &str, payload: &str) -> Result<(), EtiquetaError> {
        (**self).submit_raw(printer, payload).await
    }
}
