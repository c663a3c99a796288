//! Access to the media server's provider-scoped catalog tree.
//!
//! Everything above this module talks to the catalog through [`CatalogClient`],
//! so the tracing and search logic never sees HTTP or XML.

mod http;
mod wire;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::{
    error::CatalogError,
    models::{CatalogEntry, MediaServer, ProviderDirectory},
};

pub use http::HttpCatalogClient;

#[async_trait]
pub trait CatalogClient: Send + Sync + std::fmt::Debug {
    /// The provider directory, in the order the server lists it.
    async fn list_providers(&self, server: &MediaServer)
    -> Result<ProviderDirectory, CatalogError>;

    /// Search one provider. The provider's own root entry is never part of the result.
    async fn query_provider(
        &self,
        provider_id: &str,
        term: &str,
        server: &MediaServer,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Immediate children of `parent`, tagged with the parent's provider.
    async fn fetch_children(
        &self,
        parent: &CatalogEntry,
        server: &MediaServer,
    ) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// `src` URLs of the "play later" actions listed under `href`.
    async fn playlater_sources(
        &self,
        href: &str,
        server: &MediaServer,
    ) -> Result<Vec<String>, CatalogError>;

    /// Fire a GET at an absolute URL handed out by the server.
    async fn trigger(&self, url: &str) -> Result<(), CatalogError>;
}
