use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

pub fn crate_name() -> &'static str {
    "kbchat-cli"
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kbchat",
    version,
    about = "kbchat command line client",
    long_about = "kbchat command line client for chatting with the knowledge base and inspecting the database. Run without a subcommand for interactive mode."
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "KBCHAT_SERVER",
        default_value = DEFAULT_SERVER,
        help = "Gateway base HTTP URL"
    )]
    pub server: String,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Send one chat message or command")]
    Send {
        #[arg(help = "Message text, e.g. \"add: title | content | category\"")]
        message: String,
        #[arg(long, default_value = "default", help = "Session identifier")]
        session: String,
    },
    #[command(about = "Show database statistics")]
    Stats,
    #[command(about = "Show the database schema")]
    Schema,
    #[command(about = "Browse stored entries")]
    Browse {
        #[arg(long, default_value_t = 10, help = "Page size")]
        limit: usize,
        #[arg(long, default_value_t = 0, help = "Entries to skip")]
        offset: usize,
    },
    #[command(about = "Check gateway health")]
    Health,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("http transport error: {0}")]
    HttpTransport(String),
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("json decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct CliClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub processing_time: f64,
    pub timestamp: f64,
    pub action_performed: Option<String>,
    #[serde(default)]
    pub data_modified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseStats {
    pub total_entries: u64,
    pub schema_classes: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowseItem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowsePage {
    pub items: Vec<BrowseItem>,
    pub limit: usize,
    pub offset: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub store: String,
    pub cache: String,
}

impl CliClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CliError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| CliError::HttpTransport(err.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn chat(&self, message: &str, session_id: &str) -> Result<ChatReply, CliError> {
        if message.trim().is_empty() {
            return Err(CliError::InvalidArgument(
                "message cannot be empty".to_string(),
            ));
        }
        let payload = ChatRequest {
            message,
            session_id,
        };
        self.post_json("/api/chat", &payload).await
    }

    pub async fn stats(&self) -> Result<DatabaseStats, CliError> {
        self.get_json("/api/database/stats").await
    }

    pub async fn schema(&self) -> Result<Value, CliError> {
        self.get_json("/api/database/schema").await
    }

    pub async fn browse(&self, limit: usize, offset: usize) -> Result<BrowsePage, CliError> {
        if limit == 0 {
            return Err(CliError::InvalidArgument(
                "limit must be at least 1".to_string(),
            ));
        }
        self.get_json(&format!("/api/database/browse?limit={limit}&offset={offset}"))
            .await
    }

    pub async fn health(&self) -> Result<HealthStatus, CliError> {
        self.get_json("/health").await
    }

    async fn post_json<TReq, TRes>(&self, path: &str, payload: &TReq) -> Result<TRes, CliError>
    where
        TReq: Serialize + Sync,
        TRes: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(payload)
            .send()
            .await
            .map_err(|err| CliError::HttpTransport(err.to_string()))?;

        decode(response).await
    }

    async fn get_json<TRes>(&self, path: &str) -> Result<TRes, CliError>
    where
        TRes: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|err| CliError::HttpTransport(err.to_string()))?;

        decode(response).await
    }
}

async fn decode<TRes>(response: reqwest::Response) -> Result<TRes, CliError>
where
    TRes: for<'de> Deserialize<'de>,
{
    if response.status() != StatusCode::OK {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read body>".to_string());
        return Err(CliError::HttpStatus { status, body });
    }

    response
        .json::<TRes>()
        .await
        .map_err(|err| CliError::Decode(err.to_string()))
}

/// Footer shown under a chat reply
pub fn reply_footer(reply: &ChatReply) -> String {
    format!(
        "action: {} | data modified: {} | time: {:.3}s",
        reply.action_performed.as_deref().unwrap_or("none"),
        if reply.data_modified { "yes" } else { "no" },
        reply.processing_time
    )
}

pub fn format_stats(stats: &DatabaseStats) -> String {
    format!(
        "Total entries: {}\nSchema classes: {}\nLast updated: {}",
        stats.total_entries, stats.schema_classes, stats.timestamp
    )
}

pub fn format_browse(page: &BrowsePage) -> String {
    if page.items.is_empty() {
        return format!("No entries at offset {}.", page.offset);
    }

    let mut output = String::new();
    for (i, item) in page.items.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} ({})\n   {}\n",
            page.offset + i + 1,
            item.title,
            item.category,
            item.content.chars().take(80).collect::<String>()
        ));
    }
    output.push_str(&format!(
        "Showing {} entries (limit {}, offset {})",
        page.count, page.limit, page.offset
    ));
    output
}

pub fn format_health(health: &HealthStatus) -> String {
    format!(
        "{}: {} (store: {}, cache: {})",
        health.service, health.status, health.store, health.cache
    )
}

/// Run a one-shot subcommand and return its printable output
pub async fn run(server: &str, command: Commands) -> Result<String, CliError> {
    let client = CliClient::new(server)?;
    match command {
        Commands::Send { message, session } => {
            let reply = client.chat(&message, &session).await?;
            Ok(format!("{}\n\n{}", reply.response, reply_footer(&reply)))
        }
        Commands::Stats => Ok(format_stats(&client.stats().await?)),
        Commands::Schema => {
            let schema = client.schema().await?;
            serde_json::to_string_pretty(&schema).map_err(|err| CliError::Decode(err.to_string()))
        }
        Commands::Browse { limit, offset } => Ok(format_browse(&client.browse(limit, offset).await?)),
        Commands::Health => Ok(format_health(&client.health().await?)),
    }
}
