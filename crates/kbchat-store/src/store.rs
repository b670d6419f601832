//! Knowledge store trait and the in-memory implementation

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::schema::{knowledge_base_class, KNOWLEDGE_CLASS};
use crate::types::{
    BrowsePage, EntryPatch, KnowledgeEntry, ListQuery, NewEntry, SearchHit, SearchQuery,
    StoreHealth, StoreStats,
};

/// Knowledge store abstraction
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Create an entry, returning the store-assigned id
    async fn create(&self, entry: NewEntry) -> StoreResult<String>;

    /// Overwrite the fields present in `patch`
    async fn update(&self, id: &str, patch: EntryPatch) -> StoreResult<()>;

    /// Delete an entry
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Near-text search, most relevant first
    async fn search(&self, query: SearchQuery) -> StoreResult<Vec<SearchHit>>;

    /// List entries, optionally restricted to one category
    async fn list_all(&self, query: ListQuery) -> StoreResult<Vec<KnowledgeEntry>>;

    /// Collection statistics
    async fn stats(&self) -> StoreResult<StoreStats>;

    /// Schema description
    async fn schema(&self) -> StoreResult<serde_json::Value>;

    /// Paginated entries
    async fn browse(&self, limit: usize, offset: usize) -> StoreResult<BrowsePage>;

    /// Connectivity probe
    async fn health_check(&self) -> StoreHealth;

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}

/// In-memory knowledge store for testing and local runs.
///
/// Relevance is the fraction of query terms found in an entry's title,
/// content or category.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeStore {
    entries: Arc<RwLock<Vec<KnowledgeEntry>>>,
}

impl InMemoryKnowledgeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '.')
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn certainty(query_terms: &HashSet<String>, entry: &KnowledgeEntry) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let haystack = terms(&format!(
        "{} {} {}",
        entry.title, entry.content, entry.category
    ));
    let matched = query_terms.iter().filter(|t| haystack.contains(*t)).count();
    #[allow(clippy::cast_precision_loss)]
    let score = matched as f64 / query_terms.len() as f64;
    score
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn create(&self, entry: NewEntry) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let entry = entry.into_entry(id.clone(), Utc::now());
        self.entries.write().await.push(entry);
        Ok(id)
    }

    async fn update(&self, id: &str, patch: EntryPatch) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        patch.apply(entry, Utc::now());
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        let position = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found(id))?;
        entries.remove(position);
        Ok(())
    }

    async fn search(&self, query: SearchQuery) -> StoreResult<Vec<SearchHit>> {
        query.validate().map_err(StoreError::invalid_query)?;

        let query_terms = terms(&query.text);
        let entries = self.entries.read().await;
        let mut hits: Vec<SearchHit> = entries
            .iter()
            .filter(|e| query.category.as_ref().map_or(true, |c| &e.category == c))
            .map(|e| SearchHit::new(e.clone(), certainty(&query_terms, e)))
            .filter(|h| h.certainty > 0.0 && h.certainty >= query.min_certainty)
            .collect();

        hits.sort_by(|a, b| {
            b.certainty
                .partial_cmp(&a.certainty)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(query.limit);

        Ok(hits)
    }

    async fn list_all(&self, query: ListQuery) -> StoreResult<Vec<KnowledgeEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| query.category.as_ref().map_or(true, |c| &e.category == c))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let total = self.entries.read().await.len() as u64;
        Ok(StoreStats::now(total, 1))
    }

    async fn schema(&self) -> StoreResult<serde_json::Value> {
        Ok(serde_json::json!({ "classes": [knowledge_base_class(KNOWLEDGE_CLASS)] }))
    }

    async fn browse(&self, limit: usize, offset: usize) -> StoreResult<BrowsePage> {
        let items = self
            .entries
            .read()
            .await
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(BrowsePage::new(items, limit, offset))
    }

    async fn health_check(&self) -> StoreHealth {
        StoreHealth::Connected
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
