mod catalog;
mod config;
mod error;
mod matcher;
mod models;
mod recorder;
mod routes;
mod search;
mod state;
mod tracer;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{catalog::HttpCatalogClient, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playscout=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    // ── Config ───────────────────────────────────────────────────────────────
    let config = config::AppConfig::from_env()?;
    let config = Arc::new(config);
    info!(
        "Starting playscout against {}, binding to {}",
        config.media_server().base_url(),
        config.bind
    );
    if !config.excluded_providers.is_empty() {
        info!("Never searching: {}", config.excluded_providers.join(", "));
    }

    // ── Catalog client ───────────────────────────────────────────────────────
    let catalog = Arc::new(HttpCatalogClient::new(&config)?);

    // ── Application state ─────────────────────────────────────────────────────
    let state = AppState::new(Arc::clone(&config), catalog);

    // ── HTTP server ───────────────────────────────────────────────────────────
    let router = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, router).await?;

    Ok(())
}
