//! Common error types for Blind Check

use thiserror::Error;

/// Common result type for Blind Check operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Blind Check crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Write attempted against a read-only store
    #[error("Read-only store: {0}")]
    ReadOnly(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
