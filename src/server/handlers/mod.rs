//! HTTP handlers for the server.

use axum::http::StatusCode;

use crate::error::EtiquetaError;

pub mod calibration;
pub mod label;
pub mod printers;
pub mod products;

/// Map an engine error to a status code and message.
pub(crate) fn reject(error: EtiquetaError) -> (StatusCode, String) {
    let status = match &error {
        EtiquetaError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
        EtiquetaError::Config(_) | EtiquetaError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
        EtiquetaError::Network(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}

/// Map a failed blocking task.
pub(crate) fn task_failed(error: tokio::task::JoinError) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Task error: {}", error),
    )
}
