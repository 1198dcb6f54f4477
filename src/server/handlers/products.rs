//! Product suggestion handler.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::product::SelectedProduct;

use super::super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    /// A newer query arrived before this one resolved
    pub superseded: bool,
    pub products: Vec<SelectedProduct>,
}

/// GET /api/products/suggest?q= - Debounced product suggestions.
///
/// Lookup failures are not errors: the list just comes back empty.
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>, (StatusCode, String)> {
    let Some(service) = &state.suggestions else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Product catalog is not configured".to_string(),
        ));
    };

    let response = match service.suggest(&query.q).await {
        Some(products) => SuggestResponse {
            superseded: false,
            products,
        },
        None => SuggestResponse {
            superseded: true,
            products: Vec::new(),
        },
    };
    Ok(Json(response))
}
