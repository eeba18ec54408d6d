//! Health check endpoint
//!
//! Reports whether the data file can be read, so a monitor notices a file
//! that the fetch scripts left unparseable.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `error`
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub data_file: String,
    /// Records in the file, deleted ones included
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
///
/// Does NOT require login. 503 when the data file cannot be loaded.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut response = HealthResponse {
        status: "ok",
        module: "replydesk-ui",
        version: env!("CARGO_PKG_VERSION"),
        data_file: state.store.path().display().to_string(),
        records: None,
        error: None,
    };

    match state.store.load().await {
        Ok(records) => {
            response.records = Some(records.len());
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            warn!("Health check: data file unreadable: {}", e);
            response.status = "error";
            response.error = Some(e.to_string());
            (StatusCode::SERVICE_UNAVAILABLE, Json(response))
        }
    }
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
