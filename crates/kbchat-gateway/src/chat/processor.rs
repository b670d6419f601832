//! Chat command router
//!
//! Classifies a message against the command grammar and runs it against the
//! knowledge store. Store and cache errors never escape: they become
//! failed/not-found outcomes, or a plain cache miss.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use kbchat_cache::{search_cache_key, ResponseCache, SEARCH_CACHE_TTL};
use kbchat_store::{
    EntryPatch, KnowledgeEntry, KnowledgeStore, ListQuery, NewEntry, SearchHit, SearchQuery,
};

use super::grammar::{self, Command};
use super::render;

/// Default knowledge base display name
pub const DEFAULT_KB_NAME: &str = "HDMI City Dwellers";

const SEARCH_LIMIT: usize = 3;
const DELETE_CANDIDATES: usize = 5;
const LIST_LIMIT: usize = 10;

/// What a processed message did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Add,
    AddFailed,
    Delete,
    DeleteFailed,
    DeleteNotFound,
    Update,
    UpdateFailed,
    UpdateNotFound,
    List,
    ListEmpty,
    Stats,
    StatsError,
    Help,
    ClearCache,
    ClearCacheFailed,
    NoCache,
    Search,
    SearchCached,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::AddFailed => "add_failed",
            Self::Delete => "delete",
            Self::DeleteFailed => "delete_failed",
            Self::DeleteNotFound => "delete_not_found",
            Self::Update => "update",
            Self::UpdateFailed => "update_failed",
            Self::UpdateNotFound => "update_not_found",
            Self::List => "list",
            Self::ListEmpty => "list_empty",
            Self::Stats => "stats",
            Self::StatsError => "stats_error",
            Self::Help => "help",
            Self::ClearCache => "clear_cache",
            Self::ClearCacheFailed => "clear_cache_failed",
            Self::NoCache => "no_cache",
            Self::Search => "search",
            Self::SearchCached => "search_cached",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOutcome {
    /// Rendered reply text
    pub response: String,
    pub action: Action,
    /// Whether the store was changed
    pub data_modified: bool,
}

impl ChatOutcome {
    fn new(response: impl Into<String>, action: Action) -> Self {
        Self {
            response: response.into(),
            action,
            data_modified: false,
        }
    }

    fn modified(mut self) -> Self {
        self.data_modified = true;
        self
    }
}

/// Routes chat messages to store operations
#[derive(Clone)]
pub struct ChatProcessor {
    store: Arc<dyn KnowledgeStore>,
    cache: Option<Arc<dyn ResponseCache>>,
    kb_name: String,
}

impl ChatProcessor {
    /// Create a processor with no cache
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            store,
            cache: None,
            kb_name: DEFAULT_KB_NAME.to_string(),
        }
    }

    /// Attach a response cache
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the knowledge base display name
    pub fn with_kb_name(mut self, kb_name: impl Into<String>) -> Self {
        self.kb_name = kb_name.into();
        self
    }

    pub fn kb_name(&self) -> &str {
        &self.kb_name
    }

    /// Process one message. `session_id` is only logged.
    pub async fn process_message(&self, message: &str, session_id: &str) -> ChatOutcome {
        let message = message.trim();
        debug!(session_id = %session_id, message = %message, "Processing chat message");

        match grammar::parse(message) {
            Some(command) => self.execute(command).await,
            None => self.search(message).await,
        }
    }

    /// Run a parsed command
    pub async fn execute(&self, command: Command) -> ChatOutcome {
        match command {
            Command::Add {
                title,
                content,
                category,
            } => self.add(title, content, category).await,
            Command::Delete { term } => self.delete(&term).await,
            Command::Update { term, content } => self.update(&term, content).await,
            Command::List { category } => self.list(category).await,
            Command::Stats => self.stats().await,
            Command::Help => ChatOutcome::new(render::help(&self.kb_name), Action::Help),
            Command::Clear => self.clear().await,
        }
    }

    async fn add(&self, title: String, content: String, category: String) -> ChatOutcome {
        let entry = NewEntry::new(title.clone(), content).with_category(category.clone());
        match self.store.create(entry).await {
            Ok(id) => {
                info!(id = %id, title = %title, category = %category, "Knowledge added");
                ChatOutcome::new(
                    format!(
                        "✅ Successfully added '{title}' to the {} knowledge base in category '{category}'.",
                        self.kb_name
                    ),
                    Action::Add,
                )
                .modified()
            }
            Err(e) => {
                warn!(error = %e, title = %title, "Failed to add knowledge");
                ChatOutcome::new("❌ Failed to add knowledge to the database.", Action::AddFailed)
            }
        }
    }

    async fn delete(&self, term: &str) -> ChatOutcome {
        let Some(target) = self.first_match(term, DELETE_CANDIDATES).await else {
            return ChatOutcome::new(
                format!("❌ No items found matching '{term}' to delete."),
                Action::DeleteNotFound,
            );
        };

        match self.store.delete(&target.id).await {
            Ok(()) => {
                info!(id = %target.id, title = %target.title, "Knowledge deleted");
                ChatOutcome::new(
                    format!("✅ Successfully deleted '{}' from the knowledge base.", target.title),
                    Action::Delete,
                )
                .modified()
            }
            Err(e) => {
                warn!(error = %e, id = %target.id, "Failed to delete knowledge");
                ChatOutcome::new(
                    format!("❌ Failed to delete '{}' from the database.", target.title),
                    Action::DeleteFailed,
                )
            }
        }
    }

    async fn update(&self, term: &str, content: String) -> ChatOutcome {
        let Some(target) = self.first_match(term, 1).await else {
            return ChatOutcome::new(
                format!("❌ No items found matching '{term}' to update."),
                Action::UpdateNotFound,
            );
        };

        let patch = EntryPatch::new().with_content(content);
        match self.store.update(&target.id, patch).await {
            Ok(()) => {
                info!(id = %target.id, title = %target.title, "Knowledge updated");
                ChatOutcome::new(
                    format!("✅ Successfully updated '{}' in the knowledge base.", target.title),
                    Action::Update,
                )
                .modified()
            }
            Err(e) => {
                warn!(error = %e, id = %target.id, "Failed to update knowledge");
                ChatOutcome::new(
                    format!("❌ Failed to update '{}' in the database.", target.title),
                    Action::UpdateFailed,
                )
            }
        }
    }

    async fn list(&self, category: Option<String>) -> ChatOutcome {
        let query = ListQuery::new(LIST_LIMIT).with_category(category.clone());
        let entries = self.store.list_all(query).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list knowledge");
            Vec::new()
        });

        if entries.is_empty() {
            return ChatOutcome::new(render::list_empty(category.as_deref()), Action::ListEmpty);
        }
        ChatOutcome::new(
            render::list(&self.kb_name, category.as_deref(), &entries),
            Action::List,
        )
    }

    async fn stats(&self) -> ChatOutcome {
        match self.store.stats().await {
            Ok(stats) => ChatOutcome::new(render::stats(&self.kb_name, &stats), Action::Stats),
            Err(e) => {
                warn!(error = %e, "Failed to get database stats");
                ChatOutcome::new(
                    format!("❌ Error getting database stats: {e}"),
                    Action::StatsError,
                )
            }
        }
    }

    async fn clear(&self) -> ChatOutcome {
        let Some(cache) = &self.cache else {
            return ChatOutcome::new(
                "ℹ️ No cache to clear (cache not available).",
                Action::NoCache,
            );
        };

        match cache.flush_all().await {
            Ok(()) => ChatOutcome::new("🧹 Cache cleared successfully.", Action::ClearCache),
            Err(e) => {
                warn!(error = %e, "Failed to clear cache");
                ChatOutcome::new(
                    format!("❌ Failed to clear cache: {e}"),
                    Action::ClearCacheFailed,
                )
            }
        }
    }

    async fn search(&self, query: &str) -> ChatOutcome {
        let key = search_cache_key(query);

        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(cached)) => return ChatOutcome::new(cached, Action::SearchCached),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Cache read failed"),
            }
        }

        let hits = self.hits(query, SEARCH_LIMIT).await;
        let response = render::search_results(&self.kb_name, query, &hits);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set_with_expiry(&key, SEARCH_CACHE_TTL, &response).await {
                debug!(error = %e, "Cache write failed");
            }
        }

        ChatOutcome::new(response, Action::Search)
    }

    async fn hits(&self, text: &str, limit: usize) -> Vec<SearchHit> {
        let query = SearchQuery::new(text).with_limit(limit);
        self.store.search(query).await.unwrap_or_else(|e| {
            warn!(error = %e, query = %text, "Knowledge search failed");
            Vec::new()
        })
    }

    async fn first_match(&self, term: &str, candidates: usize) -> Option<KnowledgeEntry> {
        self.hits(term, candidates)
            .await
            .into_iter()
            .next()
            .map(|hit| hit.entry)
    }
}

impl std::fmt::Debug for ChatProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProcessor")
            .field("store", &self.store.backend_name())
            .field("cache", &self.cache.as_ref().map(|c| c.backend_name()))
            .field("kb_name", &self.kb_name)
            .finish()
    }
}
