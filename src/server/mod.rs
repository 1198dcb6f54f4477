//! # HTTP Server for Label Design and Printing
//!
//! Exposes calibration, label composition, preview and printing to the
//! store's admin front-end over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! etiqueta serve --listen 0.0.0.0:8080 --bridge ws://localhost:8182
//! ```
//!
//! ## Routes
//!
//! | Route | Action |
//! |-------|--------|
//! | `GET /api/calibration` | Current calibration profile |
//! | `PUT /api/calibration` | Merge a partial profile |
//! | `POST /api/label/script` | TSPL script as text |
//! | `POST /api/label/positions` | Element rectangles in CSS pixels |
//! | `POST /api/label/preview` | Label PNG |
//! | `POST /api/label/print` | Compose and print |
//! | `GET /api/printers` | Printers behind the bridge |
//! | `POST /api/printers/connect` | Connect to the bridge |
//! | `PUT /api/printers/selected` | Select a printer |
//! | `GET /api/products/suggest?q=` | Debounced product suggestions |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::EtiquetaError;

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Calibration API
        .route(
            "/api/calibration",
            get(handlers::calibration::get).put(handlers::calibration::update),
        )
        // Label API
        .route("/api/label/script", post(handlers::label::script))
        .route("/api/label/positions", post(handlers::label::positions))
        .route("/api/label/preview", post(handlers::label::preview))
        .route("/api/label/print", post(handlers::label::print))
        // Printer API
        .route("/api/printers", get(handlers::printers::list))
        .route("/api/printers/connect", post(handlers::printers::connect))
        .route("/api/printers/selected", put(handlers::printers::select))
        // Product API
        .route("/api/products/suggest", get(handlers::products::suggest))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use etiqueta::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), etiqueta::error::EtiquetaError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     calibration_path: "calibration.json".into(),
///     bridge_url: "ws://localhost:8182".to_string(),
///     catalog_url: Some("https://shop.example/api".to_string()),
///     catalog_token: None,
///     font_path: None,
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), EtiquetaError> {
    let app_state = Arc::new(AppState::new(&config)?);
    let app = router(app_state);

    println!("Etiqueta HTTP server starting...");
    println!("Listening on: {}", config.listen_addr);
    println!("Calibration: {}", config.calibration_path.display());
    println!("Print bridge: {}", config.bridge_url);
    match &config.catalog_url {
        Some(url) => println!("Product catalog: {}", url),
        None => println!("Product catalog: not configured (suggestions disabled)"),
    }
    println!();

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            EtiquetaError::Connectivity(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    tracing::info!(addr = %config.listen_addr, "server listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| EtiquetaError::Connectivity(format!("Server error: {}", e)))?;

    Ok(())
}
