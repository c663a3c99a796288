use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures of a single catalog fetch. Never fatal to a search on their own.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("provider unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl CatalogError {
    /// Transport-level failures are worth retrying; a body we could not parse is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Unreachable { .. })
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("provider directory unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("search cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("search timed out")]
    Timeout,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidQuery(m) => AppError::BadRequest(m),
            SearchError::Catalog(e) => AppError::BadGateway(e.to_string()),
            SearchError::Cancelled => AppError::Timeout,
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::BadGateway(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::BadGateway(m) => {
                tracing::warn!("Media server error: {m}");
                (StatusCode::BAD_GATEWAY, m.clone())
            }
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::Anyhow(e) => {
                tracing::error!("Unhandled error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
