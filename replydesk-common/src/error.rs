//! Common error types for replydesk

use thiserror::Error;

/// Common result type for replydesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across replydesk crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply data file could not be parsed or serialized
    #[error("Data file error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
