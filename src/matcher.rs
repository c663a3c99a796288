/// Decides whether a catalog entry answers a title query.
///
/// Shows and movies are told apart by shape: a folder that expands to more
/// than [`SHOW_MIN_LEAVES`] videos is taken to be a series.
use regex::{Regex, RegexBuilder};

use crate::{
    error::SearchError,
    models::{CatalogEntry, EntryKind, MatchMode, MediaKind, MediaServer},
    tracer::FolderTracer,
};

/// A folder needs strictly more leaves than this to count as a show.
pub const SHOW_MIN_LEAVES: usize = 2;

#[derive(Debug, Clone)]
pub struct TitlePattern {
    re: Regex,
}

impl TitlePattern {
    /// Case-insensitive. `Exact` compares the whole name, `Partial` looks for
    /// the term anywhere in it. The term is matched literally.
    pub fn new(term: &str, mode: MatchMode) -> Result<Self, SearchError> {
        let literal = regex::escape(term);
        let source = match mode {
            MatchMode::Exact => format!("^{literal}$"),
            MatchMode::Partial => literal,
        };
        let re = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| SearchError::InvalidQuery(format!("unusable search term: {e}")))?;
        Ok(Self { re })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.re.is_match(name)
    }
}

#[derive(Debug, Clone)]
pub struct Matcher {
    tracer: FolderTracer,
}

impl Matcher {
    pub fn new(tracer: FolderTracer) -> Self {
        Self { tracer }
    }

    pub async fn qualifies(
        &self,
        entry: &CatalogEntry,
        pattern: &TitlePattern,
        media_kind: MediaKind,
        server: &MediaServer,
    ) -> bool {
        if !pattern.matches(&entry.name) {
            return false;
        }

        match (entry.kind, media_kind) {
            (EntryKind::Video, kind) => kind != MediaKind::Show,
            // Leaf count has no bearing on movies, so skip the fetches.
            (EntryKind::Folder { .. }, MediaKind::Movie) => true,
            (EntryKind::Folder { .. }, MediaKind::Show) => {
                let leaves = self.tracer.resolve(entry, server).await;
                tracing::debug!("{:?} resolves to {} leaves", entry.name, leaves.len());
                leaves.len() > SHOW_MIN_LEAVES
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::fake::{FakeCatalog, folder, video, videos};

    fn server() -> MediaServer {
        MediaServer::new("media", 54479)
    }

    fn matcher(fake: FakeCatalog) -> (Matcher, Arc<FakeCatalog>) {
        let fake = Arc::new(fake);
        (Matcher::new(FolderTracer::new(fake.clone(), 8)), fake)
    }

    #[test]
    fn exact_is_whole_name_case_insensitive() {
        let p = TitlePattern::new("Foo", MatchMode::Exact).unwrap();
        assert!(p.matches("Foo"));
        assert!(p.matches("foo"));
        assert!(!p.matches("Foobar"));
        assert!(!p.matches("The Foo"));
    }

    #[test]
    fn partial_matches_anywhere() {
        let p = TitlePattern::new("oo", MatchMode::Partial).unwrap();
        assert!(p.matches("Foobar"));
        assert!(p.matches("BOOK"));
        assert!(!p.matches("Bar"));
    }

    #[test]
    fn terms_are_literal() {
        let p = TitlePattern::new("M*A*S*H (1972)", MatchMode::Exact).unwrap();
        assert!(p.matches("m*a*s*h (1972)"));
        assert!(!p.matches("MAS (1972)"));
    }

    #[tokio::test]
    async fn show_needs_more_than_two_leaves() {
        let three = folder("/three", "Foo", Some(3));
        let two = folder("/two", "Foo", Some(2));
        let (matcher, _) = matcher(
            FakeCatalog::new()
                .with_children("/three", videos("/three", "Ep", 3))
                .with_children("/two", videos("/two", "Ep", 2)),
        );
        let p = TitlePattern::new("foo", MatchMode::Partial).unwrap();

        assert!(matcher.qualifies(&three, &p, MediaKind::Show, &server()).await);
        assert!(!matcher.qualifies(&two, &p, MediaKind::Show, &server()).await);
    }

    #[tokio::test]
    async fn movie_folder_qualifies_without_tracing() {
        let extras = folder("/extras", "Matrix Reloaded Extras", Some(1));
        let (matcher, fake) = matcher(FakeCatalog::new());
        let p = TitlePattern::new("matrix", MatchMode::Partial).unwrap();

        assert!(matcher.qualifies(&extras, &p, MediaKind::Movie, &server()).await);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn video_is_only_ever_a_movie() {
        let film = video("/film", "The Matrix");
        let (matcher, _) = matcher(FakeCatalog::new());
        let p = TitlePattern::new("matrix", MatchMode::Partial).unwrap();

        assert!(matcher.qualifies(&film, &p, MediaKind::Movie, &server()).await);
        assert!(!matcher.qualifies(&film, &p, MediaKind::Show, &server()).await);
    }

    #[tokio::test]
    async fn name_mismatch_never_fetches() {
        let show = folder("/show", "Bar", Some(5));
        let (matcher, fake) = matcher(FakeCatalog::new());
        let p = TitlePattern::new("Foo", MatchMode::Exact).unwrap();

        assert!(!matcher.qualifies(&show, &p, MediaKind::Show, &server()).await);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn thin_wrapper_folder_is_not_a_show() {
        // An empty folder resolves to itself: one leaf.
        let wrapper = folder("/w", "Foo", Some(0));
        let (matcher, _) = matcher(FakeCatalog::new().with_children("/w", vec![]));
        let p = TitlePattern::new("Foo", MatchMode::Exact).unwrap();

        assert!(!matcher.qualifies(&wrapper, &p, MediaKind::Show, &server()).await);
        assert!(matcher.qualifies(&wrapper, &p, MediaKind::Movie, &server()).await);
    }
}
