//! Error types for the response cache

use thiserror::Error;

/// Cache error type
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Redis error: {0}")]
    #[cfg(feature = "redis")]
    Redis(#[from] redis::RedisError),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
