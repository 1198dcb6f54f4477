//! Calibration API handlers.

use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use crate::printer::{CalibrationPatch, CalibrationProfile};

use super::super::state::AppState;
use super::task_failed;

/// GET /api/calibration - Current profile, defaults filled in.
pub async fn get(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CalibrationProfile>, (StatusCode, String)> {
    let store = state.store.clone();
    let profile = tokio::task::spawn_blocking(move || store.load())
        .await
        .map_err(task_failed)?;
    Ok(Json(profile))
}

/// PUT /api/calibration - Merge a partial profile and persist it.
///
/// Unknown keys are ignored and values that do not fit a field keep the
/// previous value.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<CalibrationPatch>,
) -> Result<Json<CalibrationProfile>, (StatusCode, String)> {
    let store = state.store.clone();
    let profile = tokio::task::spawn_blocking(move || store.update(&patch))
        .await
        .map_err(task_failed)?;
    tracing::info!(
        dpi = profile.dpi,
        width_mm = profile.label_width_mm,
        height_mm = profile.label_height_mm,
        "calibration updated"
    );
    Ok(Json(profile))
}
