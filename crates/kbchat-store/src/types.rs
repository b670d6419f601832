//! Core types for the knowledge store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned when an entry is created without one
pub const DEFAULT_CATEGORY: &str = "general";

/// Near-text certainty below which hits are dropped
pub const DEFAULT_MIN_CERTAINTY: f64 = 0.6;

/// A knowledge entry as stored in the collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    /// Store-assigned identifier, immutable once assigned
    pub id: String,
    /// Entry title
    pub title: String,
    /// Entry body
    pub content: String,
    /// Category label
    pub category: String,
    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
    /// Ordered tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Fields for a new entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEntry {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl NewEntry {
    /// Create a new entry in the default category
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: Vec::new(),
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Materialize the entry under a store-assigned id
    pub fn into_entry(self, id: impl Into<String>, now: DateTime<Utc>) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.into(),
            title: self.title,
            content: self.content,
            category: self.category,
            created_at: Some(now),
            updated_at: Some(now),
            tags: self.tags,
        }
    }
}

/// Partial update. Only fields that are `Some` are written; the store
/// always refreshes `updated_at`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Apply the patch to an entry in place
    pub fn apply(&self, entry: &mut KnowledgeEntry, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            entry.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            entry.content.clone_from(content);
        }
        if let Some(category) = &self.category {
            entry.category.clone_from(category);
        }
        if let Some(tags) = &self.tags {
            entry.tags.clone_from(tags);
        }
        entry.updated_at = Some(now);
    }
}

/// Near-text search query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    /// Free text to match against
    pub text: String,
    /// Maximum number of hits
    pub limit: usize,
    /// Restrict to one category
    pub category: Option<String>,
    /// Minimum certainty (0.0 to 1.0)
    pub min_certainty: f64,
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 5,
            category: None,
            min_certainty: DEFAULT_MIN_CERTAINTY,
        }
    }

    /// Set hit limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Restrict to a category
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set minimum certainty
    pub fn with_min_certainty(mut self, certainty: f64) -> Self {
        self.min_certainty = certainty.clamp(0.0, 1.0);
        self
    }

    /// Validate the query
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("Query text cannot be empty".to_string());
        }
        if self.limit == 0 {
            return Err("Limit must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Listing query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    pub category: Option<String>,
}

impl ListQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            category: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

/// Search hit with its relevance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Matched entry
    pub entry: KnowledgeEntry,
    /// Certainty reported by the store (0.0 when absent)
    pub certainty: f64,
}

impl SearchHit {
    pub fn new(entry: KnowledgeEntry, certainty: f64) -> Self {
        Self { entry, certainty }
    }
}

/// Collection statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStats {
    pub total_entries: u64,
    pub schema_classes: usize,
    pub timestamp: String,
}

impl StoreStats {
    /// Stats stamped with the current time
    pub fn now(total_entries: u64, schema_classes: usize) -> Self {
        Self {
            total_entries,
            schema_classes,
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// One page of entries for the browse endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowsePage {
    pub items: Vec<KnowledgeEntry>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

impl BrowsePage {
    pub fn new(items: Vec<KnowledgeEntry>, limit: usize, offset: usize) -> Self {
        let count = items.len();
        Self {
            items,
            limit,
            offset,
            count,
        }
    }
}

/// Store connectivity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreHealth {
    Connected,
    Disconnected,
}

impl StoreHealth {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}
