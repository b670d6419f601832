//! Error types for the knowledge store

use thiserror::Error;

/// Knowledge store error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{backend} error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
