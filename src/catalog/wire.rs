/// Parsing of the media server's XML listings.
///
/// Every listing is a root element whose direct children are `group`
/// elements (providers, search results or folder children) and, on leaf
/// pages, `media_playlater` elements.
use serde::Deserialize;

use crate::{
    error::CatalogError,
    models::{CatalogEntry, EntryKind, Provider, ProviderDirectory},
};

#[derive(Debug, Default, Deserialize)]
struct Listing {
    #[serde(rename = "group", default)]
    groups: Vec<Group>,
    #[serde(rename = "media_playlater", default)]
    playlater: Vec<PlayLater>,
}

#[derive(Debug, Deserialize)]
struct Group {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@childs")]
    childs: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlayLater {
    #[serde(rename = "@src")]
    src: Option<String>,
}

fn parse_listing(url: &str, body: &str) -> Result<Listing, CatalogError> {
    // Some pages carry stray bytes ahead of the document element.
    let body = match body.find('<') {
        Some(idx) => &body[idx..],
        None => {
            return Err(CatalogError::Malformed {
                url: url.to_string(),
                reason: "response contains no XML".to_string(),
            });
        }
    };

    quick_xml::de::from_str(body).map_err(|e| CatalogError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

pub(super) fn parse_providers(url: &str, body: &str) -> Result<ProviderDirectory, CatalogError> {
    let listing = parse_listing(url, body)?;
    Ok(listing
        .groups
        .into_iter()
        .filter_map(|g| {
            let id = g.id.filter(|id| !id.is_empty())?;
            Some(Provider {
                name: g.name.unwrap_or_else(|| id.clone()),
                href: g.href.unwrap_or_default(),
                id,
            })
        })
        .collect())
}

/// Search results. A group carrying `id` is the provider's own root and is skipped.
pub(super) fn parse_results(
    url: &str,
    body: &str,
    provider: &str,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let listing = parse_listing(url, body)?;
    Ok(listing
        .groups
        .into_iter()
        .filter(|g| g.id.is_none())
        .filter_map(|g| into_entry(g, provider))
        .collect())
}

pub(super) fn parse_children(
    url: &str,
    body: &str,
    provider: &str,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let listing = parse_listing(url, body)?;
    Ok(listing
        .groups
        .into_iter()
        .filter_map(|g| into_entry(g, provider))
        .collect())
}

pub(super) fn parse_playlater(url: &str, body: &str) -> Result<Vec<String>, CatalogError> {
    let listing = parse_listing(url, body)?;
    Ok(listing
        .playlater
        .into_iter()
        .filter_map(|p| p.src)
        .filter(|s| !s.is_empty())
        .collect())
}

fn into_entry(group: Group, provider: &str) -> Option<CatalogEntry> {
    let Some(href) = group.href.filter(|h| !h.is_empty()) else {
        tracing::warn!("Skipping catalog entry without href: {:?}", group.name);
        return None;
    };

    // Presence of `childs` is the signal; the count itself is informational.
    let child_count = group
        .childs
        .as_deref()
        .map(|c| c.trim().parse::<u32>().unwrap_or(0));

    let kind = match (group.kind.as_deref(), child_count) {
        (Some("folder"), _) => EntryKind::Folder { child_count },
        (Some("video"), _) => EntryKind::Video,
        (_, Some(_)) => EntryKind::Folder { child_count },
        (other, None) => {
            tracing::warn!(
                "Unrecognized catalog entry kind {:?} for {href}, skipping",
                other.unwrap_or("<none>")
            );
            return None;
        }
    };

    Some(CatalogEntry {
        href,
        name: group.name.unwrap_or_default(),
        kind,
        provider: provider.to_string(),
    })
}
