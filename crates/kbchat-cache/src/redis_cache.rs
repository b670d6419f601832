//! Redis response cache

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

use crate::cache::ResponseCache;
use crate::error::{CacheError, CacheResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed cache over a reconnecting connection manager
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Open a connection to `url`, giving up after a short timeout
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Connection(e.to_string()))?;
        let manager = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout(CONNECT_TIMEOUT))??;

        info!(url = %url, "Redis cache connected");
        Ok(Self { manager })
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn flush_all(&self) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
