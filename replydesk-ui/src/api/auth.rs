//! Login, logout and the login-required middleware
//!
//! Credentials are compared against the in-memory user dictionary loaded
//! from configuration. A user without a store id is an administrator.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use replydesk_common::config::verify_password;
use replydesk_common::StoreScope;
use serde::Deserialize;
use tracing::{info, warn};

use crate::render::render_login;
use crate::session::{expired_cookie, session_cookie, session_token, Session};
use crate::AppState;

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Session for the request's cookie, if it is valid
async fn current_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = session_token(headers)?;
    state.sessions.lookup(&token).await
}

/// Login-required middleware
///
/// Valid session: the [`Session`] is added to request extensions for the
/// handler. Otherwise the browser is sent to `/login`.
pub async fn require_login(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match current_session(&state, request.headers()).await {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// GET /login
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if current_session(&state, &headers).await.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(render_login(None, "")).into_response()
}

/// POST /login
///
/// Success starts a session and redirects to the list. Failure re-renders the
/// form with 401.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim();

    let user = state
        .users
        .get(username)
        .filter(|user| verify_password(&form.password, &user.password_sha256));

    let Some(user) = user else {
        warn!("Failed login for user {:?}", username);
        return (
            StatusCode::UNAUTHORIZED,
            Html(render_login(
                Some("ユーザー名またはパスワードが違います"),
                username,
            )),
        )
            .into_response();
    };

    let scope = StoreScope::from_store_id(user.store_id.as_deref());
    let token = state.sessions.create(&user.username, scope.clone()).await;
    info!("{} logged in (scope {})", user.username, scope.label());

    (
        [(header::SET_COOKIE, session_cookie(&token))],
        Redirect::to("/"),
    )
        .into_response()
}

/// GET|POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Some(session) = state.sessions.remove(&token).await {
            info!("{} logged out", session.username);
        }
    }

    (
        [(header::SET_COOKIE, expired_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}
