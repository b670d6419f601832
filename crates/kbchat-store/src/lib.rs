//! kbchat knowledge store - store abstraction over the knowledge base collection
//!
//! This crate provides:
//! - `KnowledgeStore` trait for abstracting the vector database backend
//! - In-memory knowledge store for tests and local runs
//! - Weaviate integration (feature-gated, on by default)
//! - The `KnowledgeBase` class definition shared by every backend

pub mod error;
pub mod schema;
pub mod store;
pub mod types;

#[cfg(feature = "weaviate")]
pub mod weaviate;

pub use error::{StoreError, StoreResult};
pub use store::{InMemoryKnowledgeStore, KnowledgeStore};
pub use types::{
    BrowsePage, EntryPatch, KnowledgeEntry, ListQuery, NewEntry, SearchHit, SearchQuery,
    StoreHealth, StoreStats, DEFAULT_CATEGORY,
};

#[cfg(feature = "weaviate")]
pub use weaviate::{WeaviateConfig, WeaviateStore};

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::store::KnowledgeStore;
    pub use crate::types::{
        EntryPatch, KnowledgeEntry, ListQuery, NewEntry, SearchHit, SearchQuery, StoreHealth,
        StoreStats,
    };
}
