//! HTTP handlers for replydesk-ui

pub mod auth;
pub mod download;
pub mod error;
pub mod health;
pub mod refresh;
pub mod replies;

pub use auth::{login, login_page, logout, require_login};
pub use download::download;
pub use error::ApiError;
pub use health::health_routes;
pub use refresh::refresh;
pub use replies::{delete_reply, edit_reply, index, post_all, post_reply, save_reply};
