//! Refresh route: launch the review fetch / reply generation commands

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use crate::session::Session;
use crate::AppState;

/// POST /refresh
///
/// Starts the configured commands in the background and returns to the list
/// immediately. Outcome is logged only.
pub async fn refresh(State(state): State<AppState>, Extension(session): Extension<Session>) -> Response {
    state.refresher.trigger(&session.username);
    Redirect::to("/").into_response()
}
