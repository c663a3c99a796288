/// Fans a title query out over every provider on the media server.
///
/// Provider queries run concurrently but results are merged in directory
/// order: `buffered` yields completed futures in the order they were started.
/// A provider that fails contributes nothing; only an invalid query, an
/// unreachable provider directory or cancellation fail the whole search.
use std::{sync::Arc, time::Duration};

use futures_util::{StreamExt, stream};
use tokio_util::sync::CancellationToken;

use crate::{
    catalog::CatalogClient,
    config::AppConfig,
    error::{CatalogError, SearchError},
    matcher::{Matcher, TitlePattern},
    models::{CatalogEntry, MediaServer, Provider, ProviderDirectory, SearchQuery, SearchResult},
    tracer::FolderTracer,
};

#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    catalog: Arc<dyn CatalogClient>,
    tracer: FolderTracer,
    matcher: Matcher,
    max_concurrent_providers: usize,
    max_concurrent_traces: usize,
    excluded_providers: Vec<String>,
}

impl SearchOrchestrator {
    pub fn new(catalog: Arc<dyn CatalogClient>, config: &AppConfig) -> Self {
        let tracer = FolderTracer::new(Arc::clone(&catalog), config.max_trace_depth);
        Self {
            catalog,
            matcher: Matcher::new(tracer.clone()),
            tracer,
            max_concurrent_providers: config.max_concurrent_providers.max(1),
            max_concurrent_traces: config.max_concurrent_traces.max(1),
            excluded_providers: config.excluded_providers.clone(),
        }
    }

    pub async fn list_providers(
        &self,
        server: &MediaServer,
    ) -> Result<ProviderDirectory, CatalogError> {
        self.catalog.list_providers(server).await
    }

    /// Playable leaves beneath `entry` ("explore this folder").
    pub async fn resolve_folder(
        &self,
        entry: &CatalogEntry,
        server: &MediaServer,
    ) -> Vec<CatalogEntry> {
        self.tracer.resolve(entry, server).await
    }

    /// Like [`search`](Self::search), abandoning in-flight queries once
    /// `timeout` elapses.
    pub async fn search_within(
        &self,
        query: &SearchQuery,
        server: &MediaServer,
        timeout: Duration,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let cancel = CancellationToken::new();
        tokio::select! {
            result = self.search(query, server, &cancel) => result,
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!("Search exceeded {timeout:?}, cancelling");
                cancel.cancel();
                Err(SearchError::Cancelled)
            }
        }
    }

    pub async fn search(
        &self,
        query: &SearchQuery,
        server: &MediaServer,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        // Reject a bad term before touching the network.
        let pattern = TitlePattern::new(&query.term, query.match_mode)?;

        let directory = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SearchError::Cancelled),
            dir = self.catalog.list_providers(server) => dir?,
        };

        self.run(query, &pattern, &directory, server, cancel).await
    }

    /// Search against a directory the caller already fetched.
    pub async fn search_with_directory(
        &self,
        query: &SearchQuery,
        directory: &ProviderDirectory,
        server: &MediaServer,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let pattern = TitlePattern::new(&query.term, query.match_mode)?;
        self.run(query, &pattern, directory, server, cancel).await
    }

    async fn run(
        &self,
        query: &SearchQuery,
        pattern: &TitlePattern,
        directory: &ProviderDirectory,
        server: &MediaServer,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if directory.is_empty() {
            tracing::warn!("{} lists no providers", server.host);
        }

        let providers: Vec<Provider> = directory
            .iter()
            .filter(|p| {
                let excluded = query.excludes(&p.name) || self.excluded_providers.contains(&p.name);
                if excluded {
                    tracing::debug!("Skipping excluded provider {}", p.name);
                }
                !excluded
            })
            .cloned()
            .collect();

        tracing::info!(
            "Searching {} of {} provider(s) for {:?} ({}, {})",
            providers.len(),
            directory.len(),
            query.term,
            query.media_kind,
            query.match_mode
        );

        let per_provider: Vec<Option<Vec<SearchResult>>> = stream::iter(providers)
            .map(|provider| {
                let search = self.clone();
                let query = query.clone();
                let pattern = pattern.clone();
                let server = server.clone();
                let cancel = cancel.clone();
                async move {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        results = search.search_provider(&provider, &query, &pattern, &server) => Some(results),
                    }
                }
            })
            .buffered(self.max_concurrent_providers)
            .collect()
            .await;

        // Partial results are discarded: a cancelled search reports nothing.
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let results: Vec<SearchResult> = per_provider.into_iter().flatten().flatten().collect();
        tracing::info!("{} result(s) for {:?}", results.len(), query.term);
        Ok(results)
    }

    async fn search_provider(
        &self,
        provider: &Provider,
        query: &SearchQuery,
        pattern: &TitlePattern,
        server: &MediaServer,
    ) -> Vec<SearchResult> {
        tracing::info!("Looking up {:?} in {}", query.term, provider.name);

        let entries = match self
            .catalog
            .query_provider(&provider.id, &query.term, server)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Provider {} failed, skipping: {e}", provider.name);
                return Vec::new();
            }
        };
        tracing::info!(
            "Found {} candidate(s) for {:?} in {}",
            entries.len(),
            query.term,
            provider.name
        );

        let verdicts: Vec<bool> = stream::iter(entries.clone())
            .map(|entry| {
                let matcher = self.matcher.clone();
                let pattern = pattern.clone();
                let server = server.clone();
                let media_kind = query.media_kind;
                async move {
                    matcher
                        .qualifies(&entry, &pattern, media_kind, &server)
                        .await
                }
            })
            .buffered(self.max_concurrent_traces)
            .collect()
            .await;

        entries
            .into_iter()
            .zip(verdicts)
            .filter(|(_, ok)| *ok)
            .map(|(entry, _)| SearchResult {
                entry,
                provider_name: provider.name.clone(),
            })
            .collect()
    }
}
