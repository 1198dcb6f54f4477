//! Label script, preview and print handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    composer,
    preview::{self, PreviewPositions},
    printer::CalibrationProfile,
    product::{LabelContent, ProductSelection, SelectedProduct},
};

use super::super::state::AppState;
use super::{reject, task_failed};

/// Request body shared by every label operation.
#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub product: SelectedProduct,
    /// Active colour variant, the first one when omitted
    #[serde(default)]
    pub variant: Option<usize>,
    /// Copies to print, the calibrated default when omitted
    #[serde(default)]
    pub copies: Option<u32>,
}

impl LabelRequest {
    fn selection(&self) -> Result<ProductSelection, (StatusCode, String)> {
        ProductSelection::with_variant(self.product.clone(), self.variant).map_err(reject)
    }
}

/// Read the calibration profile off the async executor.
async fn load_profile(state: &AppState) -> Result<CalibrationProfile, (StatusCode, String)> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(task_failed)
}

/// Handle POST /api/label/script - TSPL text for the label.
pub async fn script(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LabelRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let selection = req.selection()?;
    let profile = load_profile(&state).await?;
    let rasterizer = state.rasterizer.clone();

    let script = tokio::task::spawn_blocking(move || {
        composer::compose(rasterizer.as_ref(), &profile, &selection, req.copies)
    })
    .await
    .map_err(task_failed)?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], script.to_string()))
}

/// Response of POST /api/label/positions.
#[derive(Debug, Serialize)]
pub struct PositionsResponse {
    pub content: LabelContent,
    pub positions: PreviewPositions,
}

/// Handle POST /api/label/positions - element rectangles in CSS pixels.
pub async fn positions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LabelRequest>,
) -> Result<Json<PositionsResponse>, (StatusCode, String)> {
    let selection = req.selection()?;
    let profile = load_profile(&state).await?;
    let rasterizer = state.rasterizer.clone();

    let response = tokio::task::spawn_blocking(move || {
        let profile = profile.sanitized();
        let content = LabelContent::new(&selection, &profile);
        let label = composer::arrange(rasterizer.as_ref(), &profile, &content);
        PositionsResponse {
            positions: preview::label_positions(&label),
            content,
        }
    })
    .await
    .map_err(task_failed)?;

    Ok(Json(response))
}

/// Handle POST /api/label/preview - PNG of the whole label.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LabelRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let selection = req.selection()?;
    let profile = load_profile(&state).await?;
    let rasterizer = state.rasterizer.clone();

    let png_bytes = tokio::task::spawn_blocking(move || {
        preview::render_preview(rasterizer.as_ref(), &profile, &selection).to_png()
    })
    .await
    .map_err(task_failed)?
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render preview: {}", e),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// Response of POST /api/label/print.
#[derive(Debug, Serialize)]
pub struct PrintResponse {
    pub success: bool,
    pub printer: String,
    pub lines: usize,
}

/// Handle POST /api/label/print - compose and send to the selected printer.
///
/// The script is composed before the session lock is taken; the session
/// still refuses to send it without a connection and a selected printer.
pub async fn print(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LabelRequest>,
) -> Result<Json<PrintResponse>, (StatusCode, String)> {
    let selection = req.selection()?;
    let profile = load_profile(&state).await?;
    let rasterizer = state.rasterizer.clone();

    let script = tokio::task::spawn_blocking(move || {
        composer::compose(rasterizer.as_ref(), &profile, &selection, req.copies)
    })
    .await
    .map_err(task_failed)?;

    let mut session = state.session.lock().await;
    session.print_script(&script).await.map_err(reject)?;

    Ok(Json(PrintResponse {
        success: true,
        printer: session.selected_printer().unwrap_or_default().to_string(),
        lines: script.len(),
    }))
}
