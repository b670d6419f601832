//! HTTP routes for the kbchat gateway

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use kbchat_cache::ResponseCache;
use kbchat_store::{BrowsePage, KnowledgeStore, StoreStats};

use crate::chat::ChatProcessor;
use crate::error::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    processor: ChatProcessor,
    store: Arc<dyn KnowledgeStore>,
    cache: Option<Arc<dyn ResponseCache>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        cache: Option<Arc<dyn ResponseCache>>,
        kb_name: impl Into<String>,
    ) -> Self {
        let mut processor = ChatProcessor::new(store.clone()).with_kb_name(kb_name);
        if let Some(cache) = &cache {
            processor = processor.with_cache(cache.clone());
        }
        Self {
            processor,
            store,
            cache,
        }
    }
}

/// Build the main router for the gateway
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/database/stats", get(database_stats))
        .route("/api/database/schema", get(database_schema))
        .route("/api/database/browse", get(browse))
        .with_state(state)
}

fn default_session() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Seconds spent handling the message
    pub processing_time: f64,
    /// Unix time in seconds
    pub timestamp: f64,
    pub action_performed: Option<String>,
    pub data_modified: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BrowseParams {
    #[serde(default = "default_browse_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_browse_limit() -> usize {
    10
}

fn unix_timestamp() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// Chat endpoint. Messages are processed on their own task so a panic turns
/// into a 500 instead of dropping the connection.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let started = Instant::now();
    let processor = state.processor.clone();

    let outcome = tokio::spawn(async move {
        processor
            .process_message(&request.message, &request.session_id)
            .await
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Error processing message");
        ApiError::Internal
    })?;

    let processing_time = started.elapsed().as_secs_f64();
    info!(
        action = %outcome.action,
        processing_time = %format!("{processing_time:.3}s"),
        "Message processed"
    );

    Ok(Json(ChatResponse {
        response: outcome.response,
        processing_time,
        timestamp: unix_timestamp(),
        action_performed: Some(outcome.action.as_str().to_string()),
        data_modified: outcome.data_modified,
    }))
}

async fn database_stats(State(state): State<AppState>) -> ApiResult<Json<StoreStats>> {
    state.store.stats().await.map(Json).map_err(|e| {
        error!(error = %e, "Error getting stats");
        ApiError::Stats
    })
}

async fn database_schema(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.store.schema().await.map(Json).map_err(|e| {
        error!(error = %e, "Error getting schema");
        ApiError::Schema
    })
}

async fn browse(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> ApiResult<Json<BrowsePage>> {
    state
        .store
        .browse(params.limit, params.offset)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, limit = params.limit, offset = params.offset, "Error browsing data");
            ApiError::Browse
        })
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.health_check().await;
    let cache = match &state.cache {
        Some(cache) => match cache.ping().await {
            Ok(()) => "connected",
            Err(_) => "disconnected",
        },
        None => "unavailable",
    };

    Json(json!({
        "status": "healthy",
        "service": state.processor.kb_name(),
        "store": store.as_str(),
        "cache": cache,
        "timestamp": unix_timestamp(),
    }))
}

/// Usage description
async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("{} Knowledge Base", state.processor.kb_name()),
        "version": crate::GATEWAY_VERSION,
        "description": "Conversational knowledge management over a vector database",
        "usage": {
            "chat": "POST /api/chat with {'message': 'your message'}",
            "commands": [
                "Search: 'find information about X'",
                "Add: 'add: title | content | category'",
                "Delete: 'delete: search term'",
                "Update: 'update: search term | new content'",
                "List: 'list all' or 'list category_name'",
                "Stats: 'show stats' or 'database info'",
                "Clear: 'clear'",
                "Help: 'help'"
            ]
        }
    }))
}
