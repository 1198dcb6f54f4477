//! # Print Session
//!
//! Connection status, printer selection and label submission on top of a
//! [`PrintBridge`].
//!
//! A print is all-or-nothing from the engine's side: the script is composed
//! completely in memory, then handed to the bridge in a single call. A
//! missing connection or printer aborts before anything is composed.

use serde::Serialize;

use super::PrintBridge;
use crate::composer;
use crate::error::EtiquetaError;
use crate::printer::CalibrationProfile;
use crate::product::ProductSelection;
use crate::protocol::TsplScript;
use crate::render::Rasterizer;

/// Bridge connection status shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// A bridge plus the operator's printer choice.
pub struct PrintSession<B> {
    bridge: B,
    status: BridgeStatus,
    printer: Option<String>,
}

impl<B: PrintBridge> PrintSession<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            status: BridgeStatus::Disconnected,
            printer: None,
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn status(&self) -> BridgeStatus {
        self.status
    }

    pub fn selected_printer(&self) -> Option<&str> {
        self.printer.as_deref()
    }

    /// Connect once. On failure the session stays disconnected.
    pub async fn connect(&mut self) -> Result<(), EtiquetaError> {
        self.status = BridgeStatus::Connecting;
        match self.bridge.connect().await {
            Ok(()) => {
                self.status = BridgeStatus::Connected;
                Ok(())
            }
            Err(e) => {
                self.status = BridgeStatus::Disconnected;
                tracing::warn!(error = %e, "print bridge connection failed");
                Err(e)
            }
        }
    }

    /// Refresh the status from the bridge; a dropped connection shows as
    /// disconnected.
    pub async fn refresh_status(&mut self) -> BridgeStatus {
        if self.status == BridgeStatus::Connected && !self.bridge.is_connected().await {
            tracing::warn!("print bridge connection lost");
            self.status = BridgeStatus::Disconnected;
        }
        self.status
    }

    async fn ensure_connected(&mut self) -> Result<(), EtiquetaError> {
        if self.refresh_status().await != BridgeStatus::Connected {
            return Err(EtiquetaError::Connectivity(
                "print bridge is not connected".to_string(),
            ));
        }
        Ok(())
    }

    /// List printers reachable through the bridge.
    pub async fn find_printers(&mut self) -> Result<Vec<String>, EtiquetaError> {
        self.ensure_connected().await?;
        let result = self.bridge.find_printers().await;
        self.refresh_status().await;
        result
    }

    /// Choose the printer for subsequent prints.
    pub fn select_printer(&mut self, name: &str) -> Result<(), EtiquetaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EtiquetaError::Config("printer name is empty".to_string()));
        }
        self.printer = Some(name.to_string());
        tracing::info!(printer = name, "printer selected");
        Ok(())
    }

    /// The selected printer, if the session can print right now.
    async fn ready_printer(&mut self) -> Result<String, EtiquetaError> {
        self.ensure_connected().await?;
        self.printer
            .clone()
            .ok_or_else(|| EtiquetaError::Connectivity("no printer selected".to_string()))
    }

    /// Submit a finished script in one call.
    pub async fn print_script(&mut self, script: &TsplScript) -> Result<(), EtiquetaError> {
        let printer = self.ready_printer().await?;
        let result = self.bridge.submit_raw(&printer, &script.to_string()).await;
        self.refresh_status().await;
        result?;
        tracing::info!(printer = %printer, lines = script.len(), "label submitted");
        Ok(())
    }

    /// Compose the label for `selection` and submit it.
    ///
    /// Returns the script that was sent.
    pub async fn print_label<R: Rasterizer + ?Sized>(
        &mut self,
        rasterizer: &R,
        profile: &CalibrationProfile,
        selection: &ProductSelection,
        copies: Option<u32>,
    ) -> Result<TsplScript, EtiquetaError> {
        self.ready_printer().await?;
        let script = composer::compose(rasterizer, profile, selection, copies);
        self.print_script(&script).await?;
        Ok(script)
    }
}
