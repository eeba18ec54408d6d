//! Server-side login sessions
//!
//! A session is a random 256-bit token held in memory and handed to the
//! browser as an `HttpOnly` cookie. Sessions expire after a period of
//! inactivity and do not survive a restart.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use replydesk_common::StoreScope;
use tokio::sync::RwLock;
use tracing::debug;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "replydesk_session";

/// Logged-in user, inserted into request extensions by the login middleware
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    /// Stores this user may see and modify
    pub scope: StoreScope,
    last_seen: DateTime<Utc>,
}

/// In-memory session table
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_minutes: u64) -> Self {
        // Clamp to a year so the conversion cannot overflow
        let minutes = ttl_minutes.clamp(1, 60 * 24 * 365) as i64;
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::minutes(minutes),
        }
    }

    /// Start a session and return its token
    pub async fn create(&self, username: &str, scope: StoreScope) -> String {
        let token = generate_token();
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| now - s.last_seen < self.ttl);
        sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                scope,
                last_seen: now,
            },
        );
        token
    }

    /// Session for `token` if it exists and has not expired
    ///
    /// A successful lookup extends the session.
    pub async fn lookup(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get_mut(token) {
            Some(session) if now - session.last_seen < self.ttl => {
                session.last_seen = now;
                return Some(session.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(session) = sessions.remove(token) {
                debug!("Session for {} expired", session.username);
            }
        }
        None
    }

    /// End a session
    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.write().await.remove(token)
    }

    #[cfg(test)]
    async fn backdate(&self, token: &str, by: Duration) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.last_seen = session.last_seen - by;
        }
    }
}

/// Session token from the request's `Cookie` headers
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// `Set-Cookie` value clearing the session cookie
pub fn expired_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = SessionStore::new(60);
        let token = store.create("shibuya", StoreScope::Store("s1".into())).await;
        assert_eq!(token.len(), 64);

        let session = store.lookup(&token).await.expect("session should exist");
        assert_eq!(session.username, "shibuya");
        assert_eq!(session.scope, StoreScope::Store("s1".into()));

        assert!(store.lookup("not-a-token").await.is_none());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = SessionStore::new(60);
        let a = store.create("admin", StoreScope::All).await;
        let b = store.create("admin", StoreScope::All).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let store = SessionStore::new(30);
        let token = store.create("admin", StoreScope::All).await;

        store.backdate(&token, Duration::minutes(31)).await;
        assert!(store.lookup(&token).await.is_none());
        assert!(store.remove(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_ends_session() {
        let store = SessionStore::new(30);
        let token = store.create("admin", StoreScope::All).await;
        assert!(store.remove(&token).await.is_some());
        assert!(store.lookup(&token).await.is_none());
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; replydesk_session=abc123; lang=ja"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("replydesk_session="));
        assert_eq!(session_token(&headers), None);

        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
