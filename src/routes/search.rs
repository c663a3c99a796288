use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    config::split_names,
    error::Result,
    models::{Provider, SearchQuery, SearchResult},
    state::AppState,
};

#[derive(Deserialize)]
pub struct ServerQuery {
    pub server: Option<String>,
}

/// GET /api/providers?server=...
pub async fn list_providers(
    State(state): State<AppState>,
    Query(params): Query<ServerQuery>,
) -> Result<Json<Vec<Provider>>> {
    let server = state.server(params.server.as_deref());
    let directory = state.search.list_providers(&server).await?;
    Ok(Json(directory.iter().cloned().collect()))
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(alias = "search_term")]
    pub term: String,
    #[serde(alias = "media_type")]
    pub media: Option<String>,
    #[serde(rename = "match", alias = "match_type")]
    pub match_mode: Option<String>,
    /// Comma-separated provider names.
    #[serde(default)]
    pub exclude: String,
    pub server: Option<String>,
}

/// GET /api/search?term=...&media=show|movie&match=partial|exact&exclude=a,b&server=...
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>> {
    let query = SearchQuery::parse(
        &params.term,
        params.media.as_deref(),
        params.match_mode.as_deref(),
        split_names(&params.exclude),
    )?;
    let server = state.server(params.server.as_deref());

    let results = state
        .search
        .search_within(&query, &server, state.config.search_timeout())
        .await?;

    Ok(Json(results))
}
