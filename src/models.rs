use serde::{Deserialize, Serialize};

use crate::error::SearchError;

// ── Media server address ───────────────────────────────────────────────────────

/// Address of the media server whose catalog is being searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaServer {
    pub host: String,
    pub port: u16,
}

impl MediaServer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Same port, different host. Used when a caller names a server explicitly.
    pub fn with_host(&self, host: Option<&str>) -> Self {
        match host.map(str::trim).filter(|h| !h.is_empty()) {
            Some(h) => Self::new(h, self.port),
            None => self.clone(),
        }
    }
}

// ── Providers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provider {
    pub name: String,
    pub id: String,
    pub href: String,
}

/// Providers in the order the server listed them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ProviderDirectory {
    providers: Vec<Provider>,
}

impl ProviderDirectory {
    /// Insert keeps the first position of a name but takes the newer record,
    /// like updating an ordered map.
    pub fn insert(&mut self, provider: Provider) {
        match self.providers.iter_mut().find(|p| p.name == provider.name) {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl FromIterator<Provider> for ProviderDirectory {
    fn from_iter<I: IntoIterator<Item = Provider>>(iter: I) -> Self {
        let mut dir = ProviderDirectory::default();
        for p in iter {
            dir.insert(p);
        }
        dir
    }
}

// ── Catalog entries ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryKind {
    /// `child_count` is present whenever the server says the node has nested
    /// content; the number itself is informational.
    Folder {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        child_count: Option<u32>,
    },
    Video,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Folder { .. } => write!(f, "folder"),
            EntryKind::Video => write!(f, "video"),
        }
    }
}

/// One node of a provider's catalog tree. `href` is only unique within the
/// owning provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub href: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: EntryKind,
    pub provider: String,
}

impl CatalogEntry {
    pub fn is_video(&self) -> bool {
        matches!(self.kind, EntryKind::Video)
    }
}

// ── Query ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Show,
    Movie,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaKind::Show => "show",
            MediaKind::Movie => "movie",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MediaKind {
    type Err = SearchError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "show" => Ok(MediaKind::Show),
            "movie" => Ok(MediaKind::Movie),
            other => Err(SearchError::InvalidQuery(format!(
                "media must be 'show' or 'movie', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Partial,
    Exact,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchMode::Partial => "partial",
            MatchMode::Exact => "exact",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MatchMode {
    type Err = SearchError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partial" => Ok(MatchMode::Partial),
            "exact" => Ok(MatchMode::Exact),
            other => Err(SearchError::InvalidQuery(format!(
                "match must be 'partial' or 'exact', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub term: String,
    pub media_kind: MediaKind,
    pub match_mode: MatchMode,
    pub excluded_providers: Vec<String>,
}

impl SearchQuery {
    /// Validates the raw request shape before any network activity.
    pub fn parse(
        term: &str,
        media: Option<&str>,
        match_mode: Option<&str>,
        excluded_providers: Vec<String>,
    ) -> Result<Self, SearchError> {
        let term = term.split_whitespace().collect::<Vec<_>>().join(" ");
        if term.is_empty() {
            return Err(SearchError::InvalidQuery(
                "search term must not be empty".to_string(),
            ));
        }
        Ok(Self {
            term,
            media_kind: media.map(str::parse::<MediaKind>).transpose()?.unwrap_or_default(),
            match_mode: match_mode.map(str::parse::<MatchMode>).transpose()?.unwrap_or_default(),
            excluded_providers,
        })
    }

    pub fn excludes(&self, provider_name: &str) -> bool {
        self.excluded_providers.iter().any(|p| p == provider_name)
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// A catalog entry that satisfied a query, tagged with the provider it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub provider_name: String,
}

/// Outcome of queueing a title for recording.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RecordReport {
    pub leaves: usize,
    pub queued: usize,
    pub failed: usize,
    /// The folder nested too deep to be traced completely.
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, id: &str) -> Provider {
        Provider {
            name: name.to_string(),
            id: id.to_string(),
            href: format!("/data/data.xml?id={id}"),
        }
    }

    #[test]
    fn directory_keeps_first_position_for_duplicate_names() {
        let dir: ProviderDirectory = vec![
            provider("A", "1"),
            provider("B", "2"),
            provider("A", "3"),
        ]
        .into_iter()
        .collect();

        let ids: Vec<_> = dir.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["3", "2"]);
    }

    #[test]
    fn query_rejects_unknown_media_and_match() {
        assert!(matches!(
            SearchQuery::parse("x", Some("album"), None, vec![]),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            SearchQuery::parse("x", None, Some("fuzzy"), vec![]),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            SearchQuery::parse("   ", None, None, vec![]),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn query_defaults_and_normalises_term() {
        let q = SearchQuery::parse("  The   Matrix ", Some("MOVIE"), None, vec![]).unwrap();
        assert_eq!(q.term, "The Matrix");
        assert_eq!(q.media_kind, MediaKind::Movie);
        assert_eq!(q.match_mode, MatchMode::Partial);
    }

    #[test]
    fn entry_serialises_with_flat_type_tag() {
        let entry = CatalogEntry {
            href: "/data/data.xml?id=x-1".to_string(),
            name: "Season 1".to_string(),
            kind: EntryKind::Folder {
                child_count: Some(10),
            },
            provider: "p1".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["child_count"], 10);

        let back: CatalogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn server_host_override_keeps_port() {
        let server = MediaServer::new("127.0.0.1", 54479);
        assert_eq!(
            server.with_host(Some("10.0.0.2")).base_url(),
            "http://10.0.0.2:54479"
        );
        assert_eq!(server.with_host(Some(" ")), server);
    }
}
