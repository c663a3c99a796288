use std::sync::Arc;

use crate::{
    catalog::CatalogClient, config::AppConfig, models::MediaServer, recorder::Recorder,
    search::SearchOrchestrator, tracer::FolderTracer,
};

/// Shared application state injected into every Axum handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub search: SearchOrchestrator,
    pub recorder: Recorder,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, catalog: Arc<dyn CatalogClient>) -> Self {
        let tracer = FolderTracer::new(Arc::clone(&catalog), config.max_trace_depth);
        Self {
            search: SearchOrchestrator::new(Arc::clone(&catalog), &config),
            recorder: Recorder::new(catalog, tracer),
            config,
        }
    }

    /// The configured media server, or the same port on `host` when a caller names one.
    pub fn server(&self, host: Option<&str>) -> MediaServer {
        self.config.media_server().with_host(host)
    }
}
