//! Server state and configuration.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::EtiquetaError;
use crate::printer::{CalibrationStore, JsonFileStore};
use crate::render::{Rasterizer, SoftwareRasterizer};
use crate::search::{RestCatalog, SuggestionService};
use crate::transport::{PrintBridge, PrintSession, WebSocketBridge};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Calibration JSON file
    pub calibration_path: PathBuf,
    /// Print bridge websocket URL (e.g., "ws://localhost:8182")
    pub bridge_url: String,
    /// Product API base URL; suggestions are disabled without one
    pub catalog_url: Option<String>,
    /// Bearer token for the product API
    pub catalog_token: Option<String>,
    /// TrueType font for label text; the built-in bitmap font otherwise
    pub font_path: Option<PathBuf>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub store: Arc<dyn CalibrationStore>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub session: Mutex<PrintSession<Box<dyn PrintBridge>>>,
    pub suggestions: Option<SuggestionService>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self, EtiquetaError> {
        let rasterizer = match &config.font_path {
            Some(path) => SoftwareRasterizer::with_font_file(path)?,
            None => SoftwareRasterizer::new(),
        };
        let suggestions = match &config.catalog_url {
            Some(url) => {
                let catalog = RestCatalog::new(url, config.catalog_token.clone())?;
                Some(SuggestionService::new(Arc::new(catalog)))
            }
            None => None,
        };

        Ok(Self::with_parts(
            Arc::new(JsonFileStore::new(&config.calibration_path)),
            Arc::new(rasterizer),
            Box::new(WebSocketBridge::new(config.bridge_url.clone())),
            suggestions,
        ))
    }

    pub fn with_parts(
        store: Arc<dyn CalibrationStore>,
        rasterizer: Arc<dyn Rasterizer>,
        bridge: Box<dyn PrintBridge>,
        suggestions: Option<SuggestionService>,
    ) -> Self {
        Self {
            store,
            rasterizer,
            session: Mutex::new(PrintSession::new(bridge)),
            suggestions,
        }
    }
}
