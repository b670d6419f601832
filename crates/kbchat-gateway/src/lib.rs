//! kbchat Gateway - conversational front-end for the knowledge base
//!
//! This crate implements the HTTP surface, handling:
//! - Chat command parsing and routing
//! - Search with response caching
//! - Database pass-through endpoints
//! - Configuration and backend wiring

pub mod chat;
pub mod config;
pub mod error;
pub mod router;

#[cfg(test)]
mod testing;

pub use chat::{Action, ChatOutcome, ChatProcessor};
pub use config::{CacheBackend, Config, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use router::{build_routes, AppState, ChatRequest, ChatResponse};

/// Gateway version
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");
