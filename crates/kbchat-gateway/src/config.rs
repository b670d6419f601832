//! Gateway configuration
//!
//! Every setting is a command line flag with an environment fallback.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use kbchat_cache::{InMemoryCache, RedisCache, ResponseCache};
use kbchat_store::{
    InMemoryKnowledgeStore, KnowledgeStore, StoreResult, WeaviateConfig, WeaviateStore,
};

use crate::chat::DEFAULT_KB_NAME;

/// Knowledge store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Weaviate,
    /// Process-local store, contents are lost on exit
    Memory,
}

/// Response cache backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackend {
    Redis,
    Memory,
    None,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kbchat-gateway",
    version,
    about = "Conversational knowledge base gateway"
)]
pub struct Config {
    #[arg(long, env = "KBCHAT_BIND_ADDR", default_value = "0.0.0.0:8000", help = "Listen address")]
    pub bind: SocketAddr,

    #[arg(long, env = "KBCHAT_STORE", value_enum, default_value_t = StoreBackend::Weaviate)]
    pub store: StoreBackend,

    #[arg(long, env = "WEAVIATE_URL", default_value = "http://weaviate:8080")]
    pub weaviate_url: String,

    #[arg(long, env = "WEAVIATE_API_KEY", hide_env_values = true)]
    pub weaviate_api_key: Option<String>,

    #[arg(long, env = "KBCHAT_CACHE", value_enum, default_value_t = CacheBackend::Redis)]
    pub cache: CacheBackend,

    #[arg(long, env = "REDIS_URL", default_value = "redis://redis:6379")]
    pub redis_url: String,

    #[arg(long, env = "KBCHAT_KB_NAME", default_value = DEFAULT_KB_NAME, help = "Knowledge base display name")]
    pub kb_name: String,
}

impl Config {
    /// Connect the configured store. Failure is fatal to startup.
    pub async fn connect_store(&self) -> StoreResult<Arc<dyn KnowledgeStore>> {
        match self.store {
            StoreBackend::Weaviate => {
                let mut config = WeaviateConfig::new(&self.weaviate_url);
                if let Some(api_key) = &self.weaviate_api_key {
                    config = config.with_api_key(api_key);
                }
                let store = WeaviateStore::connect(config).await?;
                Ok(Arc::new(store))
            }
            StoreBackend::Memory => {
                warn!("Using in-memory knowledge store; entries are not persisted");
                Ok(Arc::new(InMemoryKnowledgeStore::new()))
            }
        }
    }

    /// Connect the configured cache. An unreachable cache leaves the gateway
    /// running without one.
    pub async fn connect_cache(&self) -> Option<Arc<dyn ResponseCache>> {
        match self.cache {
            CacheBackend::Redis => match RedisCache::connect(&self.redis_url).await {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    warn!(error = %e, url = %self.redis_url, "Redis unavailable, running without cache");
                    None
                }
            },
            CacheBackend::Memory => Some(Arc::new(InMemoryCache::new())),
            CacheBackend::None => {
                info!("Response cache disabled");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_container_layout() {
        let config = Config::try_parse_from(["kbchat-gateway"]).unwrap();

        assert_eq!(config.bind, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.store, StoreBackend::Weaviate);
        assert_eq!(config.weaviate_url, "http://weaviate:8080");
        assert_eq!(config.cache, CacheBackend::Redis);
        assert_eq!(config.redis_url, "redis://redis:6379");
        assert_eq!(config.kb_name, "HDMI City Dwellers");
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "kbchat-gateway",
            "--bind",
            "127.0.0.1:9000",
            "--store",
            "memory",
            "--cache",
            "none",
            "--kb-name",
            "Test KB",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.cache, CacheBackend::None);
        assert_eq!(config.kb_name, "Test KB");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Config::try_parse_from(["kbchat-gateway", "--store", "sqlite"]).is_err());
    }

    #[tokio::test]
    async fn memory_backends_connect() {
        let config =
            Config::try_parse_from(["kbchat-gateway", "--store", "memory", "--cache", "memory"])
                .unwrap();

        let store = config.connect_store().await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        let cache = config.connect_cache().await.unwrap();
        assert_eq!(cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn unreachable_redis_degrades_to_no_cache() {
        let config = Config::try_parse_from([
            "kbchat-gateway",
            "--redis-url",
            "not a redis url",
        ])
        .unwrap();

        assert!(config.connect_cache().await.is_none());
    }
}
