//! In-memory catalog for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;

use super::CatalogClient;
use crate::{
    error::CatalogError,
    models::{CatalogEntry, EntryKind, MediaServer, Provider, ProviderDirectory},
};

pub fn folder(href: &str, name: &str, child_count: Option<u32>) -> CatalogEntry {
    CatalogEntry {
        href: href.to_string(),
        name: name.to_string(),
        kind: EntryKind::Folder { child_count },
        provider: "p1".to_string(),
    }
}

pub fn video(href: &str, name: &str) -> CatalogEntry {
    CatalogEntry {
        href: href.to_string(),
        name: name.to_string(),
        kind: EntryKind::Video,
        provider: "p1".to_string(),
    }
}

/// `count` videos named `{prefix} {n}` under `{href}/{n}`.
pub fn videos(href: &str, prefix: &str, count: usize) -> Vec<CatalogEntry> {
    (1..=count)
        .map(|n| video(&format!("{href}/{n}"), &format!("{prefix} {n}")))
        .collect()
}

#[derive(Debug, Default)]
pub struct FakeCatalog {
    providers: Vec<Provider>,
    directory_fails: bool,
    results: HashMap<String, Vec<CatalogEntry>>,
    children: HashMap<String, Vec<CatalogEntry>>,
    playlater: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    triggered: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, name: &str, id: &str) -> Self {
        self.providers.push(Provider {
            name: name.to_string(),
            id: id.to_string(),
            href: format!("/data/data.xml?id={id}"),
        });
        self
    }

    pub fn with_results(mut self, provider_id: &str, entries: Vec<CatalogEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.provider = provider_id.to_string();
                e
            })
            .collect();
        self.results.insert(provider_id.to_string(), entries);
        self
    }

    pub fn with_children(mut self, href: &str, entries: Vec<CatalogEntry>) -> Self {
        self.children.insert(href.to_string(), entries);
        self
    }

    pub fn with_playlater(mut self, href: &str, srcs: &[&str]) -> Self {
        self.playlater
            .insert(href.to_string(), srcs.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Any call keyed by `key` (provider id, href or trigger URL) fails as unreachable.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn failing_directory(mut self) -> Self {
        self.directory_fails = true;
        self
    }

    pub fn slow(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    /// Every call made so far, as `"<operation> <key>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn triggered(&self) -> Vec<String> {
        self.triggered.lock().unwrap().clone()
    }

    async fn visit(&self, op: &str, key: &str) -> Result<(), CatalogError> {
        self.calls.lock().unwrap().push(format!("{op} {key}"));
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(key) {
            return Err(CatalogError::Unreachable {
                url: key.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_providers(
        &self,
        server: &MediaServer,
    ) -> Result<ProviderDirectory, CatalogError> {
        self.calls.lock().unwrap().push(format!("list {}", server.host));
        if self.directory_fails {
            return Err(CatalogError::Malformed {
                url: server.base_url(),
                reason: "not xml".to_string(),
            });
        }
        Ok(self.providers.iter().cloned().collect())
    }

    async fn query_provider(
        &self,
        provider_id: &str,
        _term: &str,
        _server: &MediaServer,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.visit("query", provider_id).await?;
        Ok(self.results.get(provider_id).cloned().unwrap_or_default())
    }

    async fn fetch_children(
        &self,
        parent: &CatalogEntry,
        _server: &MediaServer,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.visit("fetch", &parent.href).await?;
        Ok(self.children.get(&parent.href).cloned().unwrap_or_default())
    }

    async fn playlater_sources(
        &self,
        href: &str,
        _server: &MediaServer,
    ) -> Result<Vec<String>, CatalogError> {
        self.visit("playlater", href).await?;
        Ok(self.playlater.get(href).cloned().unwrap_or_default())
    }

    async fn trigger(&self, url: &str) -> Result<(), CatalogError> {
        self.visit("trigger", url).await?;
        self.triggered.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
