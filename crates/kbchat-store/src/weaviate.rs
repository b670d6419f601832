//! Weaviate knowledge store implementation
//!
//! Talks to Weaviate's REST API for object CRUD and schema, and to its
//! GraphQL endpoint for near-text search, listing and aggregation.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::schema::{class_count, has_class, knowledge_base_class, ENTRY_PROPERTIES, KNOWLEDGE_CLASS};
use crate::store::KnowledgeStore;
use crate::types::{
    BrowsePage, EntryPatch, KnowledgeEntry, ListQuery, NewEntry, SearchHit, SearchQuery,
    StoreHealth, StoreStats, DEFAULT_CATEGORY,
};

const BACKEND: &str = "weaviate";

/// Configuration for the Weaviate connection
#[derive(Debug, Clone)]
pub struct WeaviateConfig {
    /// Weaviate server URL
    pub url: String,
    /// API key sent as a bearer token (optional)
    pub api_key: Option<String>,
    /// Class holding the entries
    pub class_name: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            url: "http://weaviate:8080".to_string(),
            api_key: None,
            class_name: KNOWLEDGE_CLASS.to_string(),
            timeout_secs: 30,
        }
    }
}

impl WeaviateConfig {
    /// Create a new configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set class name
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Weaviate knowledge store
#[derive(Debug)]
pub struct WeaviateStore {
    client: Client,
    config: WeaviateConfig,
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Additional {
    id: Option<String>,
    certainty: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    title: Option<String>,
    content: Option<String>,
    category: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    tags: Option<Vec<String>>,
    #[serde(rename = "_additional", default)]
    additional: Option<Additional>,
}

impl RawObject {
    fn into_hit(self) -> SearchHit {
        let certainty = self
            .additional
            .as_ref()
            .and_then(|a| a.certainty)
            .unwrap_or(0.0);
        SearchHit::new(self.into_entry(), certainty)
    }

    fn into_entry(self) -> KnowledgeEntry {
        KnowledgeEntry {
            id: self.additional.and_then(|a| a.id).unwrap_or_default(),
            title: self.title.unwrap_or_else(|| "Untitled".to_string()),
            content: self.content.unwrap_or_default(),
            category: self
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            updated_at: self.updated_at.as_deref().and_then(parse_timestamp),
            tags: self.tags.unwrap_or_default(),
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Quote a string as a GraphQL string literal
fn graphql_string(value: &str) -> String {
    Value::from(value).to_string()
}

fn category_filter(category: &str) -> String {
    format!(
        "where: {{path: [\"category\"], operator: Equal, valueText: {}}}",
        graphql_string(category)
    )
}

impl WeaviateStore {
    /// Connect to Weaviate and make sure the class exists.
    ///
    /// Fails when the server is unreachable or rejects the schema request.
    pub async fn connect(config: WeaviateConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let store = Self { client, config };
        let schema = store
            .fetch_schema()
            .await
            .map_err(|e| StoreError::connection(format!("{}: {e}", store.config.url)))?;
        store.ensure_class(&schema).await?;

        info!(
            url = %store.config.url,
            class = %store.config.class_name,
            "Weaviate knowledge store initialized"
        );

        Ok(store)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> StoreResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> StoreResult<T> {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StoreError::backend(BACKEND, format!("invalid response body: {e}")))
    }

    async fn fetch_schema(&self) -> StoreResult<Value> {
        self.send_json(self.request(Method::GET, "/v1/schema")).await
    }

    async fn ensure_class(&self, schema: &Value) -> StoreResult<()> {
        let class_name = &self.config.class_name;
        if has_class(schema, class_name) {
            return Ok(());
        }

        info!(class = %class_name, "Creating Weaviate class");
        self.send(
            self.request(Method::POST, "/v1/schema")
                .json(&knowledge_base_class(class_name)),
        )
        .await?;
        debug!(class = %class_name, "Class created successfully");
        Ok(())
    }

    /// Run a GraphQL query, surfacing GraphQL-level errors
    async fn graphql(&self, query: String) -> StoreResult<Value> {
        debug!(query = %query, "Weaviate GraphQL request");
        let response: Value = self
            .send_json(
                self.request(Method::POST, "/v1/graphql")
                    .json(&json!({ "query": query })),
            )
            .await?;

        if let Some(errors) = response.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let message = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(StoreError::backend(BACKEND, message));
            }
        }

        Ok(response)
    }

    fn get_query(&self, arguments: &[String], additional: &str) -> String {
        format!(
            "{{ Get {{ {class}({args}) {{ {fields} _additional {{ {additional} }} }} }} }}",
            class = self.config.class_name,
            args = arguments.join(", "),
            fields = ENTRY_PROPERTIES.join(" "),
        )
    }

    fn parse_objects(&self, response: &Value) -> StoreResult<Vec<RawObject>> {
        let pointer = format!("/data/Get/{}", self.config.class_name);
        match response.pointer(&pointer) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(objects) => Ok(serde_json::from_value(objects.clone())?),
        }
    }

    async fn fetch_entries(&self, arguments: &[String]) -> StoreResult<Vec<KnowledgeEntry>> {
        let response = self.graphql(self.get_query(arguments, "id")).await?;
        Ok(self
            .parse_objects(&response)?
            .into_iter()
            .map(RawObject::into_entry)
            .collect())
    }

    fn object_path(&self, id: &str) -> String {
        format!("/v1/objects/{}/{}", self.config.class_name, id)
    }
}

#[async_trait]
impl KnowledgeStore for WeaviateStore {
    async fn create(&self, entry: NewEntry) -> StoreResult<String> {
        let now = timestamp(Utc::now());
        let body = json!({
            "class": self.config.class_name,
            "properties": {
                "title": entry.title,
                "content": entry.content,
                "category": entry.category,
                "created_at": now,
                "updated_at": now,
                "tags": entry.tags,
            }
        });

        let created: CreatedObject = self
            .send_json(self.request(Method::POST, "/v1/objects").json(&body))
            .await?;

        info!(id = %created.id, title = %entry.title, "Added knowledge entry");
        Ok(created.id)
    }

    async fn update(&self, id: &str, patch: EntryPatch) -> StoreResult<()> {
        let mut properties = match serde_json::to_value(&patch)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        properties.insert("updated_at".to_string(), Value::from(timestamp(Utc::now())));

        let body = json!({
            "class": self.config.class_name,
            "properties": properties,
        });

        self.send(self.request(Method::PATCH, &self.object_path(id)).json(&body))
            .await?;

        info!(id = %id, "Updated knowledge entry");
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.send(self.request(Method::DELETE, &self.object_path(id)))
            .await?;

        info!(id = %id, "Deleted knowledge entry");
        Ok(())
    }

    async fn search(&self, query: SearchQuery) -> StoreResult<Vec<SearchHit>> {
        query.validate().map_err(StoreError::invalid_query)?;

        let mut arguments = vec![
            format!(
                "nearText: {{concepts: [{}], certainty: {}}}",
                graphql_string(&query.text),
                query.min_certainty
            ),
            format!("limit: {}", query.limit),
        ];
        if let Some(category) = &query.category {
            arguments.push(category_filter(category));
        }

        let response = self.graphql(self.get_query(&arguments, "certainty id")).await?;
        let hits: Vec<SearchHit> = self
            .parse_objects(&response)?
            .into_iter()
            .map(RawObject::into_hit)
            .collect();

        debug!(query = %query.text, hits = hits.len(), "Near-text search completed");
        Ok(hits)
    }

    async fn list_all(&self, query: ListQuery) -> StoreResult<Vec<KnowledgeEntry>> {
        let mut arguments = vec![format!("limit: {}", query.limit)];
        if let Some(category) = &query.category {
            arguments.push(category_filter(category));
        }
        self.fetch_entries(&arguments).await
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let query = format!(
            "{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}",
            self.config.class_name
        );
        let response = self.graphql(query).await?;
        let pointer = format!("/data/Aggregate/{}/0/meta/count", self.config.class_name);
        let total = response
            .pointer(&pointer)
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let schema = self.fetch_schema().await?;
        Ok(StoreStats::now(total, class_count(&schema)))
    }

    async fn schema(&self) -> StoreResult<Value> {
        self.fetch_schema().await
    }

    async fn browse(&self, limit: usize, offset: usize) -> StoreResult<BrowsePage> {
        let arguments = [format!("limit: {limit}"), format!("offset: {offset}")];
        let items = self.fetch_entries(&arguments).await?;
        Ok(BrowsePage::new(items, limit, offset))
    }

    async fn health_check(&self) -> StoreHealth {
        match self.fetch_schema().await {
            Ok(_) => StoreHealth::Connected,
            Err(e) => {
                warn!(error = %e, "Weaviate health check failed");
                StoreHealth::Disconnected
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}
