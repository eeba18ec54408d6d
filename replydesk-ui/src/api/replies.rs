//! Reply list, inline edit and posting handlers
//!
//! Indexes in paths are positions in the data file. An index that is out of
//! range, belongs to another store or points at a deleted record is ignored
//! and the browser is sent back to the list.

use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use replydesk_common::{ListFilter, StatusView, StoreScope};
use serde::Deserialize;
use tracing::{debug, info};

use super::ApiError;
use crate::render::{list_query, render_index, ListPage};
use crate::session::Session;
use crate::AppState;

/// List filter carried in the query string
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `all`, `pending` or `posted`
    pub view: Option<String>,
    /// Store to narrow to (administrators only)
    pub store: Option<String>,
}

impl ListQuery {
    fn status(&self) -> StatusView {
        StatusView::parse(self.view.as_deref())
    }

    fn scope(&self, session: &Session) -> StoreScope {
        session.scope.narrow(self.store.as_deref())
    }

    /// Redirect back to the list with the same filter
    fn back_to_list(&self, session: &Session) -> Redirect {
        let store = match self.scope(session) {
            StoreScope::Store(id) if session.scope.is_admin() => Some(id),
            _ => None,
        };
        Redirect::to(&format!("/{}", list_query(self.status(), store.as_deref())))
    }
}

/// Reply form field
#[derive(Debug, Deserialize)]
pub struct SaveForm {
    pub reply: String,
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, ApiError> {
    render_list(&state, &session, &query, None).await.map(Html)
}

/// GET /edit/:index
///
/// The list page with an inline form for one record.
pub async fn edit_reply(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if state.store.get(index, &session.scope).await?.is_none() {
        debug!("{} cannot edit record {}", session.username, index);
        return Ok(query.back_to_list(&session).into_response());
    }

    let html = render_list(&state, &session, &query, Some(index)).await?;
    Ok(Html(html).into_response())
}

/// POST /save/:index
pub async fn save_reply(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
    Query(query): Query<ListQuery>,
    Form(form): Form<SaveForm>,
) -> Result<Redirect, ApiError> {
    if state.store.save_reply(index, &session.scope, &form.reply).await? {
        info!("{} edited reply {}", session.username, index);
    }
    Ok(query.back_to_list(&session))
}

/// POST /post/:index
///
/// Marks the reply as posted. Posting an already posted reply changes nothing.
pub async fn post_reply(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
    Query(query): Query<ListQuery>,
) -> Result<Redirect, ApiError> {
    if state.store.mark_posted(index, &session.scope).await? {
        info!("{} marked reply {} posted", session.username, index);
    }
    Ok(query.back_to_list(&session))
}

/// POST /delete/:index
///
/// Soft delete: the record stays in the file with `deleted = true`.
pub async fn delete_reply(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(index): Path<usize>,
    Query(query): Query<ListQuery>,
) -> Result<Redirect, ApiError> {
    if state.store.soft_delete(index, &session.scope).await? {
        info!("{} deleted reply {}", session.username, index);
    }
    Ok(query.back_to_list(&session))
}

/// POST /post_all
///
/// Marks every visible, not yet posted reply as posted.
pub async fn post_all(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> Result<Redirect, ApiError> {
    let filter = ListFilter::new(query.scope(&session), query.status());
    let changed = state.store.post_all(&filter).await?;
    if changed > 0 {
        info!("{} bulk posted {} reply(s)", session.username, changed);
    } else {
        debug!("{} bulk post found nothing to post", session.username);
    }
    Ok(query.back_to_list(&session))
}

async fn render_list(
    state: &AppState,
    session: &Session,
    query: &ListQuery,
    editing: Option<usize>,
) -> Result<String, ApiError> {
    let scope = query.scope(session);

    // Administrators get a store picker built from the stores present in the file
    let stores: Vec<String> = if session.scope.is_admin() {
        state
            .store
            .load()
            .await?
            .into_iter()
            .filter(|r| !r.deleted)
            .filter_map(|r| r.store_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    } else {
        Vec::new()
    };

    let records = state
        .store
        .list(&ListFilter::new(scope.clone(), StatusView::All))
        .await?;

    Ok(render_index(&ListPage {
        session,
        scope: &scope,
        status: query.status(),
        records: &records,
        stores: &stores,
        editing,
        refresh_running: state.refresher.is_running(),
    }))
}
