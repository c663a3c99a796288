/// `CatalogClient` over the media server's HTTP/XML data endpoint.
use std::time::Duration;

use async_trait::async_trait;

use super::{CatalogClient, wire};
use crate::{
    config::AppConfig,
    error::CatalogError,
    models::{CatalogEntry, MediaServer, ProviderDirectory},
};

const DATA_PATH: &str = "/data/data.xml";

#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    max_retries: u32,
    retry_base: Duration,
}

impl HttpCatalogClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            max_retries: config.max_fetch_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
        })
    }

    /// GET `url` and return the body, retrying transport failures with
    /// exponential backoff (base, 2×base, 4×base, …).
    async fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let wait = self.backoff(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Fetch failed ({e}), retry {attempt}/{} in {wait:?}",
                        self.max_retries
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base.saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn get_once(&self, url: &str) -> Result<String, CatalogError> {
        let unreachable = |reason: String| CatalogError::Unreachable {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(unreachable(format!("HTTP {}", resp.status())));
        }

        // Listings are not always valid UTF-8; decode lossily like a browser would.
        let bytes = resp.bytes().await.map_err(|e| unreachable(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_providers(
        &self,
        server: &MediaServer,
    ) -> Result<ProviderDirectory, CatalogError> {
        let url = format!("{}{DATA_PATH}", server.base_url());
        let body = self.get_text(&url).await?;
        let providers = wire::parse_providers(&url, &body)?;
        tracing::debug!("{} provider(s) listed by {}", providers.len(), server.host);
        Ok(providers)
    }

    async fn query_provider(
        &self,
        provider_id: &str,
        term: &str,
        server: &MediaServer,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        // The server expects spaces as %20, not the `+` of form encoding.
        let url = format!(
            "{}{DATA_PATH}?id={}&searchterm={}",
            server.base_url(),
            urlencoding::encode(provider_id),
            urlencoding::encode(term)
        );
        let body = self.get_text(&url).await?;
        wire::parse_results(&url, &body, provider_id)
    }

    async fn fetch_children(
        &self,
        parent: &CatalogEntry,
        server: &MediaServer,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = format!("{}{}", server.base_url(), parent.href);
        let body = self.get_text(&url).await?;
        wire::parse_children(&url, &body, &parent.provider)
    }

    async fn playlater_sources(
        &self,
        href: &str,
        server: &MediaServer,
    ) -> Result<Vec<String>, CatalogError> {
        let url = format!("{}{href}", server.base_url());
        let body = self.get_text(&url).await?;
        wire::parse_playlater(&url, &body)
    }

    async fn trigger(&self, url: &str) -> Result<(), CatalogError> {
        self.get_text(url).await.map(|_| ())
    }
}
