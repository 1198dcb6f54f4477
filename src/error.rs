//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Malformed or out-of-range calibration, bad selection index
    #[error("Configuration error: {0}")]
    Config(String),

    /// Print bridge unreachable, not connected, or no printer selected
    #[error("Printer connection error: {0}")]
    Connectivity(String),

    /// Barcode symbol encoding or text rasterization failure
    #[error("Render error: {0}")]
    Render(String),

    /// Product catalog request failure
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid command or parameter
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtiquetaError {
    /// Whether the operator has to reconnect or pick a printer before retrying.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}
