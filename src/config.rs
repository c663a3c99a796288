use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::models::MediaServer;

/// Application configuration, loaded from environment variables / .env.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bind address for the HTTP server.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Host of the media server used when a request does not name one.
    #[serde(default = "default_media_server_host")]
    pub media_server_host: String,

    /// Port the media server's catalog listens on.
    #[serde(default = "default_media_server_port")]
    pub media_server_port: u16,

    /// Timeout applied to every single catalog fetch.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for a fetch that failed at the transport level (0 = no retries).
    /// Each retry waits 2^n * `retry_base_ms`.
    #[serde(default = "default_max_fetch_retries")]
    pub max_fetch_retries: u32,

    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Provider queries in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_providers: usize,

    /// Folder traces in flight at once while filtering one provider's results.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_traces: usize,

    /// How many folder levels below a search result the tracer may descend.
    #[serde(default = "default_max_trace_depth")]
    pub max_trace_depth: usize,

    /// Upper bound for a whole search request; in-flight queries are abandoned after it.
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    /// Comma-separated provider names that are never searched.
    #[serde(default, deserialize_with = "comma_separated")]
    pub excluded_providers: Vec<String>,
}

fn default_bind() -> String {
    "0.0.0.0:8001".to_string()
}
fn default_media_server_host() -> String {
    "127.0.0.1".to_string()
}
fn default_media_server_port() -> u16 {
    54479
}
fn default_request_timeout_secs() -> u64 {
    20
}
fn default_max_fetch_retries() -> u32 {
    2
}
fn default_retry_base_ms() -> u64 {
    500
}
fn default_max_concurrent() -> usize {
    4
}
fn default_max_trace_depth() -> usize {
    8
}
fn default_search_timeout_secs() -> u64 {
    120
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(split_names(&raw))
}

/// Splits a comma-separated list, dropping blanks.
pub fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            media_server_host: default_media_server_host(),
            media_server_port: default_media_server_port(),
            request_timeout_secs: default_request_timeout_secs(),
            max_fetch_retries: default_max_fetch_retries(),
            retry_base_ms: default_retry_base_ms(),
            max_concurrent_providers: default_max_concurrent(),
            max_concurrent_traces: default_max_concurrent(),
            max_trace_depth: default_max_trace_depth(),
            search_timeout_secs: default_search_timeout_secs(),
            excluded_providers: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present; a missing file is fine
        let _ = dotenvy::dotenv();

        envy::from_env::<AppConfig>().context("Failed to load config from environment")
    }

    pub fn media_server(&self) -> MediaServer {
        MediaServer::new(&self.media_server_host, self.media_server_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}
