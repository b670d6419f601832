//! Response cache trait and the in-memory implementation

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::CacheResult;

/// Lifetime of a cached search response
pub const SEARCH_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Cache key for a search query: `search:` plus the hex SHA-256 of the
/// lower-cased query text.
pub fn search_cache_key(query: &str) -> String {
    let digest = Sha256::digest(query.to_lowercase().as_bytes());
    format!("search:{}", hex::encode(digest))
}

/// Response cache abstraction
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Fetch a live value
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value that expires after `ttl`
    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> CacheResult<()>;

    /// Drop every cached value
    async fn flush_all(&self) -> CacheResult<()>;

    /// Connectivity probe
    async fn ping(&self) -> CacheResult<()>;

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    expires_at: Instant,
}

/// In-memory TTL cache. Expired values are dropped on read of their key and
/// swept on every write.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCache {
    values: Arc<RwLock<HashMap<String, CachedValue>>>,
}

impl InMemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values, expired ones included
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Whether the cache holds no values
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl ResponseCache for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        {
            let values = self.values.read().await;
            match values.get(key) {
                None => return Ok(None),
                Some(cached) if cached.expires_at > now => return Ok(Some(cached.value.clone())),
                Some(_) => {}
            }
        }

        let mut values = self.values.write().await;
        if values.get(key).is_some_and(|cached| cached.expires_at <= now) {
            values.remove(key);
        }
        Ok(None)
    }

    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> CacheResult<()> {
        let now = Instant::now();
        let mut values = self.values.write().await;
        values.retain(|_, cached| cached.expires_at > now);
        values.insert(
            key.to_string(),
            CachedValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn flush_all(&self) -> CacheResult<()> {
        self.values.write().await.clear();
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_case_insensitive() {
        assert_eq!(search_cache_key("What is HDMI"), search_cache_key("what is hdmi"));
        assert_ne!(search_cache_key("hdmi"), search_cache_key("hdmi 2.1"));
    }

    #[test]
    fn test_search_ttl_is_one_hour() {
        assert_eq!(SEARCH_CACHE_TTL, Duration::from_secs(3600));
    }

    #[test]
    fn test_cache_key_shape() {
        let key = search_cache_key("hdmi");
        assert!(key.starts_with("search:"));
        assert_eq!(key.len(), "search:".len() + 64);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache
            .set_with_expiry("k", SEARCH_CACHE_TTL, "rendered")
            .await
            .unwrap();

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("rendered"));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_expire() {
        let cache = InMemoryCache::new();
        cache
            .set_with_expiry("k", Duration::from_millis(10), "rendered")
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_write_sweeps_expired_values() {
        let cache = InMemoryCache::new();
        for i in 0..1000 {
            cache
                .set_with_expiry(&format!("short:{i}"), Duration::from_millis(1), "stale")
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(20)).await;

        cache
            .set_with_expiry("fresh", SEARCH_CACHE_TTL, "live")
            .await
            .unwrap();

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("fresh").await.unwrap().as_deref(), Some("live"));
    }

    #[tokio::test]
    async fn test_flush_all_clears_everything() {
        let cache = InMemoryCache::new();
        cache.set_with_expiry("a", SEARCH_CACHE_TTL, "1").await.unwrap();
        cache.set_with_expiry("b", SEARCH_CACHE_TTL, "2").await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.flush_all().await.unwrap();

        assert!(cache.is_empty().await);
        assert!(cache.ping().await.is_ok());
    }
}
