//! Error types for the peer registry service
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the peer registry service
#[derive(Error, Debug)]
pub enum Error {
    /// Node query errors (unreachable endpoint, malformed response)
    #[error("node query error: {0}")]
    NodeQuery(String),

    /// List store errors (read/write/list failures)
    #[error("list store error: {0}")]
    ListStore(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP-level errors surfaced by implementation crates
    #[error("http error: {0}")]
    Http(String),

    /// Authentication errors (object store credentials)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Store-backend-specific error
    #[error("store error ({backend}): {message}")]
    Backend {
        /// Backend name
        backend: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a node query error
    pub fn node_query(msg: impl Into<String>) -> Self {
        Self::NodeQuery(msg.into())
    }

    /// Create a list store error
    pub fn list_store(msg: impl Into<String>) -> Self {
        Self::ListStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a store-backend-specific error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
