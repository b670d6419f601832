//! Mock store and cache for unit tests

use async_trait::async_trait;
use mockall::mock;
use std::time::Duration;

use kbchat_cache::{CacheResult, ResponseCache};
use kbchat_store::{
    BrowsePage, EntryPatch, KnowledgeEntry, KnowledgeStore, ListQuery, NewEntry, SearchHit,
    SearchQuery, StoreHealth, StoreResult, StoreStats,
};

mock! {
    pub Store {}

    #[async_trait]
    impl KnowledgeStore for Store {
        async fn create(&self, entry: NewEntry) -> StoreResult<String>;
        async fn update(&self, id: &str, patch: EntryPatch) -> StoreResult<()>;
        async fn delete(&self, id: &str) -> StoreResult<()>;
        async fn search(&self, query: SearchQuery) -> StoreResult<Vec<SearchHit>>;
        async fn list_all(&self, query: ListQuery) -> StoreResult<Vec<KnowledgeEntry>>;
        async fn stats(&self) -> StoreResult<StoreStats>;
        async fn schema(&self) -> StoreResult<serde_json::Value>;
        async fn browse(&self, limit: usize, offset: usize) -> StoreResult<BrowsePage>;
        async fn health_check(&self) -> StoreHealth;
        fn backend_name(&self) -> &'static str;
    }
}

mock! {
    pub Cache {}

    #[async_trait]
    impl ResponseCache for Cache {
        async fn get(&self, key: &str) -> CacheResult<Option<String>>;
        async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> CacheResult<()>;
        async fn flush_all(&self) -> CacheResult<()>;
        async fn ping(&self) -> CacheResult<()>;
        fn backend_name(&self) -> &'static str;
    }
}
