//! # replydesk Common Library
//!
//! Shared code for the replydesk review reply panel:
//! - Review reply record model and list filters
//! - JSON file store (whole-file read-modify-write)
//! - CSV export
//! - Configuration loading
//! - Error types

pub mod config;
pub mod error;
pub mod export;
pub mod records;
pub mod store;

pub use error::{Error, Result};
pub use records::{ListFilter, ReplyRecord, StatusView, StoreScope};
pub use store::ReplyStore;
