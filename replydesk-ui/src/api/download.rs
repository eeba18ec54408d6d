//! CSV export of the records visible to the session

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Local;
use replydesk_common::export::{export_filename, to_csv};
use replydesk_common::{ListFilter, StatusView};
use tracing::info;

use super::replies::ListQuery;
use super::ApiError;
use crate::session::Session;
use crate::AppState;

/// GET /download
///
/// Same store/posted filter as the list page; deleted records are never
/// exported.
pub async fn download(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let scope = session.scope.narrow(query.store.as_deref());
    let filter = ListFilter::new(scope, StatusView::parse(query.view.as_deref()));

    let records = state.store.list(&filter).await?;
    let csv = to_csv(records.iter().map(|(_, record)| record))?;
    let filename = export_filename(&filter.scope, Local::now());

    info!(
        "{} exported {} record(s) as {}",
        session.username,
        records.len(),
        filename
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}
