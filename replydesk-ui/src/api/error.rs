//! Error responses for reply handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Handler errors
#[derive(Debug)]
pub enum ApiError {
    /// Data file could not be read, parsed or written
    StorageError(String),
    /// CSV could not be produced
    ExportError(String),
}

impl From<replydesk_common::Error> for ApiError {
    fn from(e: replydesk_common::Error) -> Self {
        match e {
            replydesk_common::Error::Csv(_) => ApiError::ExportError(e.to_string()),
            _ => ApiError::StorageError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::StorageError(msg) => format!("Storage error: {}", msg),
            ApiError::ExportError(msg) => format!("Export error: {}", msg),
        };
        error!("{}", message);

        let body = Json(json!({
            "error": message,
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
