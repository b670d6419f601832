//! E2E tests for the gateway HTTP API over in-memory backends

use std::sync::Arc;

use axum::Router;
use kbchat_cache::{InMemoryCache, ResponseCache};
use kbchat_gateway::{build_routes, AppState, ChatResponse};
use kbchat_store::InMemoryKnowledgeStore;
use serde_json::{json, Value};
use tokio::net::TcpListener;

struct TestGateway {
    base: String,
    http: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestGateway {
    async fn chat(&self, message: &str) -> ChatResponse {
        self.http
            .post(format!("{}/api/chat", self.base))
            .json(&json!({ "message": message, "session_id": "e2e" }))
            .send()
            .await
            .expect("chat request")
            .error_for_status()
            .expect("chat status")
            .json()
            .await
            .expect("chat response body")
    }

    async fn get(&self, path: &str) -> Value {
        self.http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .expect("get request")
            .error_for_status()
            .expect("get status")
            .json()
            .await
            .expect("json body")
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn spawn_gateway(with_cache: bool) -> TestGateway {
    let cache: Option<Arc<dyn ResponseCache>> = if with_cache {
        Some(Arc::new(InMemoryCache::new()))
    } else {
        None
    };
    let state = AppState::new(Arc::new(InMemoryKnowledgeStore::new()), cache, "HDMI City Dwellers");
    let app: Router = build_routes(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve gateway app");
    });

    TestGateway {
        base: format!("http://{addr}"),
        http: reqwest::Client::new(),
        handle,
    }
}

#[tokio::test]
async fn gateway_health_check() {
    let gateway = spawn_gateway(true).await;
    let health = gateway.get("/health").await;

    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "HDMI City Dwellers");
    assert_eq!(health["store"], "connected");
    assert_eq!(health["cache"], "connected");
}

#[tokio::test]
async fn knowledge_lifecycle_over_chat() {
    let gateway = spawn_gateway(true).await;

    let added = gateway
        .chat("add: HDMI 2.1 | Latest HDMI standard with 48Gbps bandwidth | technology")
        .await;
    assert_eq!(added.action_performed.as_deref(), Some("add"));
    assert!(added.data_modified);

    let listed = gateway.chat("list technology").await;
    assert_eq!(listed.action_performed.as_deref(), Some("list"));
    assert!(listed.response.contains("1. **HDMI 2.1** (technology)"));

    let updated = gateway
        .chat("update: HDMI 2.1 | HDMI 2.1 supports 8K video")
        .await;
    assert_eq!(updated.action_performed.as_deref(), Some("update"));
    assert!(updated.data_modified);

    let browsed = gateway.get("/api/database/browse?limit=5").await;
    assert_eq!(browsed["count"], 1);
    assert_eq!(browsed["items"][0]["content"], "HDMI 2.1 supports 8K video");

    let deleted = gateway.chat("delete: HDMI 2.1").await;
    assert_eq!(deleted.action_performed.as_deref(), Some("delete"));
    assert!(deleted.response.contains("'HDMI 2.1'"));

    let empty = gateway.chat("list all").await;
    assert_eq!(empty.action_performed.as_deref(), Some("list_empty"));
}

#[tokio::test]
async fn repeated_search_is_cached_until_cleared() {
    let gateway = spawn_gateway(true).await;
    gateway
        .chat("add: Smart Signage | Public displays fed over HDMI | smart-city")
        .await;

    let first = gateway.chat("smart signage").await;
    let second = gateway.chat("Smart Signage").await;
    assert_eq!(first.action_performed.as_deref(), Some("search"));
    assert_eq!(second.action_performed.as_deref(), Some("search_cached"));
    assert_eq!(first.response, second.response);
    assert!(!second.data_modified);

    let cleared = gateway.chat("clear").await;
    assert_eq!(cleared.action_performed.as_deref(), Some("clear_cache"));

    let third = gateway.chat("smart signage").await;
    assert_eq!(third.action_performed.as_deref(), Some("search"));
}

#[tokio::test]
async fn unknown_topics_and_missing_targets() {
    let gateway = spawn_gateway(false).await;

    let search = gateway.chat("what is hdmi").await;
    assert_eq!(search.action_performed.as_deref(), Some("search"));
    assert!(search.response.contains("couldn't find any information"));

    let delete = gateway.chat("delete: nothing here").await;
    assert_eq!(delete.action_performed.as_deref(), Some("delete_not_found"));
    assert!(!delete.data_modified);

    let update = gateway.chat("update: nothing here | text").await;
    assert_eq!(update.action_performed.as_deref(), Some("update_not_found"));

    let clear = gateway.chat("clear").await;
    assert_eq!(clear.action_performed.as_deref(), Some("no_cache"));
}

#[tokio::test]
async fn stats_and_schema_endpoints() {
    let gateway = spawn_gateway(false).await;
    gateway.chat("add: A | first entry").await;
    gateway.chat("add: B | second entry | demo").await;

    let stats = gateway.get("/api/database/stats").await;
    assert_eq!(stats["total_entries"], 2);
    assert_eq!(stats["schema_classes"], 1);

    let chat_stats = gateway.chat("show stats").await;
    assert_eq!(chat_stats.action_performed.as_deref(), Some("stats"));
    assert!(chat_stats.response.contains("Total Entries: 2"));

    let schema = gateway.get("/api/database/schema").await;
    assert_eq!(schema["classes"][0]["class"], "KnowledgeBase");
}

#[tokio::test]
async fn session_id_is_optional() {
    let gateway = spawn_gateway(false).await;
    let response = gateway
        .http
        .post(format!("{}/api/chat", gateway.base))
        .json(&json!({ "message": "help" }))
        .send()
        .await
        .expect("chat request");

    assert!(response.status().is_success());
    let body: ChatResponse = response.json().await.expect("chat response body");
    assert_eq!(body.action_performed.as_deref(), Some("help"));
    assert!(body.response.contains("HDMI City Dwellers"));
}
