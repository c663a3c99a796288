use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    error::Result,
    models::{CatalogEntry, RecordReport},
    state::AppState,
};

/// A catalog entry as handed back by a previous search, plus an optional server.
#[derive(Deserialize)]
pub struct EntryBody {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub server: Option<String>,
}

/// POST /api/folder: playable leaves beneath an entry
pub async fn resolve_folder(
    State(state): State<AppState>,
    Json(body): Json<EntryBody>,
) -> Result<Json<Vec<CatalogEntry>>> {
    let server = state.server(body.server.as_deref());
    let leaves = state.search.resolve_folder(&body.entry, &server).await;
    Ok(Json(leaves))
}

/// POST /api/record: queue every leaf beneath an entry for recording
pub async fn record(
    State(state): State<AppState>,
    Json(body): Json<EntryBody>,
) -> Result<Json<RecordReport>> {
    let server = state.server(body.server.as_deref());
    let report = state.recorder.record(&body.entry, &server).await;
    Ok(Json(report))
}
