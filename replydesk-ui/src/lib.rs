//! replydesk-ui library - review reply management panel
//!
//! Staff log in, review the AI-generated replies for their store, edit them
//! inline, mark them posted (singly or in bulk), soft-delete them and export
//! them as CSV.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use replydesk_common::config::{TomlConfig, UserConfig};
use replydesk_common::ReplyStore;

pub mod api;
pub mod refresh;
pub mod render;
pub mod session;

use refresh::Refresher;
use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Reply records file
    pub store: Arc<ReplyStore>,
    /// Credential dictionary keyed by username
    pub users: Arc<HashMap<String, UserConfig>>,
    pub sessions: SessionStore,
    pub refresher: Refresher,
}

impl AppState {
    /// Create application state from loaded configuration
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            store: Arc::new(ReplyStore::new(config.data_file.clone())),
            users: Arc::new(config.credentials()),
            sessions: SessionStore::new(config.session_ttl_minutes),
            refresher: Refresher::new(&config.refresh),
        }
    }
}

/// Build application router
///
/// Everything except login, logout and health requires a session.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    // Protected routes (require login)
    let protected = Router::new()
        .route("/", get(api::index))
        .route("/edit/:index", get(api::edit_reply))
        .route("/save/:index", post(api::save_reply))
        .route("/post/:index", post(api::post_reply))
        .route("/delete/:index", post(api::delete_reply))
        .route("/post_all", post(api::post_all))
        .route("/download", get(api::download))
        .route("/refresh", post(api::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_login,
        ));

    // Public routes (no login)
    let public = Router::new()
        .route("/login", get(api::login_page).post(api::login))
        .route("/logout", get(api::logout).post(api::logout))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
