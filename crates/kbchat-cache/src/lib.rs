//! kbchat response cache
//!
//! Rendered search responses are cached whole, keyed by a digest of the
//! lower-cased query, and expire after a fixed TTL.
//!
//! This crate provides:
//! - `ResponseCache` trait
//! - In-memory TTL cache for tests and single-process runs
//! - Redis backend (feature-gated, on by default)

pub mod cache;
pub mod error;

#[cfg(feature = "redis")]
pub mod redis_cache;

pub use cache::{search_cache_key, InMemoryCache, ResponseCache, SEARCH_CACHE_TTL};
pub use error::{CacheError, CacheResult};

#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;
