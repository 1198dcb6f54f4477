//! Print bridge and printer selection handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::transport::BridgeStatus;

use super::super::state::AppState;
use super::reject;

/// Bridge status and printer choice.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: BridgeStatus,
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printers: Option<Vec<String>>,
}

/// GET /api/printers - Printers reachable through the bridge.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    let printers = session.find_printers().await.map_err(reject)?;
    Ok(Json(SessionResponse {
        status: session.status(),
        selected: session.selected_printer().map(str::to_string),
        printers: Some(printers),
    }))
}

/// POST /api/printers/connect - Connect to the bridge once.
pub async fn connect(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    session.connect().await.map_err(reject)?;
    Ok(Json(SessionResponse {
        status: session.status(),
        selected: session.selected_printer().map(str::to_string),
        printers: None,
    }))
}

/// Request body for selecting a printer.
#[derive(Debug, Deserialize)]
pub struct SelectPrinterRequest {
    pub name: String,
}

/// PUT /api/printers/selected - Choose the printer for labels.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectPrinterRequest>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let mut session = state.session.lock().await;
    session.select_printer(&req.name).map_err(reject)?;
    Ok(Json(SessionResponse {
        status: session.refresh_status().await,
        selected: session.selected_printer().map(str::to_string),
        printers: None,
    }))
}
