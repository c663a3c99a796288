/// Queues a title for recording on the media server.
///
/// The entry is resolved to its playable leaves; each leaf page lists
/// "play later" action URLs, and requesting one of them queues that video.
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    catalog::CatalogClient,
    models::{CatalogEntry, MediaServer, RecordReport},
    tracer::FolderTracer,
};

#[derive(Debug, Clone)]
pub struct Recorder {
    catalog: Arc<dyn CatalogClient>,
    tracer: FolderTracer,
}

impl Recorder {
    pub fn new(catalog: Arc<dyn CatalogClient>, tracer: FolderTracer) -> Self {
        Self { catalog, tracer }
    }

    /// Never fails as a whole: unreachable leaves and rejected actions are
    /// counted in the report.
    pub async fn record(&self, entry: &CatalogEntry, server: &MediaServer) -> RecordReport {
        let trace = self.tracer.trace(entry, server).await;
        let leaves = trace.leaves;
        let mut report = RecordReport {
            leaves: leaves.len(),
            truncated: trace.overflowed,
            ..Default::default()
        };

        for leaf in &leaves {
            let sources = match self.catalog.playlater_sources(&leaf.href, server).await {
                Ok(sources) => sources,
                Err(e) => {
                    warn!("No record actions for {:?}: {e}", leaf.name);
                    report.failed += 1;
                    continue;
                }
            };

            for src in sources {
                match self.catalog.trigger(&src).await {
                    Ok(()) => report.queued += 1,
                    Err(e) => {
                        warn!("Record action for {:?} failed: {e}", leaf.name);
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            "Queued {} recording(s) for {:?} ({} leaves, {} failures)",
            report.queued, entry.name, report.leaves, report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fake::{FakeCatalog, folder, video, videos};

    fn server() -> MediaServer {
        MediaServer::new("media", 54479)
    }

    fn recorder(fake: FakeCatalog) -> (Recorder, Arc<FakeCatalog>) {
        let fake = Arc::new(fake);
        let tracer = FolderTracer::new(fake.clone(), 8);
        (Recorder::new(fake.clone(), tracer), fake)
    }

    #[tokio::test]
    async fn records_every_leaf_of_a_folder() {
        let show = folder("/show", "Show", Some(2));
        let fake = FakeCatalog::new()
            .with_children("/show", videos("/show", "Ep", 2))
            .with_playlater("/show/1", &["http://media/rec?id=1"])
            .with_playlater("/show/2", &["http://media/rec?id=2"]);
        let (recorder, fake) = recorder(fake);

        let report = recorder.record(&show, &server()).await;

        assert_eq!(
            report,
            RecordReport {
                leaves: 2,
                queued: 2,
                failed: 0,
                truncated: false,
            }
        );
        assert_eq!(
            fake.triggered(),
            ["http://media/rec?id=1", "http://media/rec?id=2"]
        );
    }

    #[tokio::test]
    async fn bare_video_is_recorded_directly() {
        let film = video("/film", "Film");
        let (recorder, fake) =
            recorder(FakeCatalog::new().with_playlater("/film", &["http://media/rec?id=f"]));

        let report = recorder.record(&film, &server()).await;

        assert_eq!(report.queued, 1);
        assert!(!fake.calls().iter().any(|c| c.starts_with("fetch ")));
    }

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let show = folder("/show", "Show", Some(3));
        let fake = FakeCatalog::new()
            .with_children("/show", videos("/show", "Ep", 3))
            .failing("/show/1")
            .with_playlater("/show/2", &["http://media/rec?id=2"])
            .with_playlater("/show/3", &["http://media/rec?id=3"])
            .failing("http://media/rec?id=3");
        let (recorder, fake) = recorder(fake);

        let report = recorder.record(&show, &server()).await;

        assert_eq!(
            report,
            RecordReport {
                leaves: 3,
                queued: 1,
                failed: 2,
                truncated: false,
            }
        );
        assert_eq!(fake.triggered(), ["http://media/rec?id=2"]);
    }

    #[tokio::test]
    async fn deep_folders_are_flagged_as_truncated() {
        let root = folder("/l0", "Deep", Some(1));
        let mut fake = FakeCatalog::new();
        for n in 0..12 {
            fake = fake.with_children(
                &format!("/l{n}"),
                vec![folder(&format!("/l{}", n + 1), "Level", Some(1))],
            );
        }
        let (recorder, _) = recorder(fake);

        let report = recorder.record(&root, &server()).await;
        assert!(report.truncated);
        assert_eq!(report.leaves, 0);
    }
}
