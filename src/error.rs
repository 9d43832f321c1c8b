//! Error types for CodeMapper.
//!
//! Ranking itself cannot fail: malformed counts are coerced to zero while
//! deserializing and empty results are plain empty vectors. Everything that
//! *can* fail (layout bounds, cache lookups, templates, the purge client) is
//! collected in [`CodeMapperError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Custom error type for CodeMapper operations.
#[derive(Debug, Error)]
pub enum CodeMapperError {
    /// Map dimensions leave no room for a generated hotspot.
    /// Non-retryable: the map size is misconfigured upstream.
    #[error("invalid layout bounds: {width}x{height} (both axes must exceed 100)")]
    InvalidLayoutBounds { width: u32, height: u32 },

    /// No cache file exists for the country, with or without the `_` suffix.
    #[error("no developer data for country '{0}'")]
    CountryNotFound(String),

    /// The country exists but has no developer with this login.
    #[error("no developer '{0}' in this country")]
    DeveloperNotFound(String),

    /// Unrecognised ranking criterion in a request.
    #[error("unknown ranking criterion '{0}' (expected public, total or followers)")]
    InvalidCriterion(String),

    /// Error reading or listing cache files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing JSON data.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Error making HTTP requests.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Error with HTTP headers (e.g., a token with invalid characters).
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// A share or API URL could not be assembled.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// A blocking file task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// Error when a remote API returns an unexpected status or body.
    #[error("Invalid API response: {0}")]
    InvalidApiResponse(String),
}

impl CodeMapperError {
    /// HTTP status a handler should answer with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CountryNotFound(_) | Self::DeveloperNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCriterion(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CodeMapperError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_map_to_404() {
        assert_eq!(
            CodeMapperError::CountryNotFound("Atlantis".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CodeMapperError::DeveloperNotFound("ghost".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_criterion_maps_to_400() {
        assert_eq!(
            CodeMapperError::InvalidCriterion("stars".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_layout_bounds_is_server_error() {
        let err = CodeMapperError::InvalidLayoutBounds {
            width: 100,
            height: 600,
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("100x600"));
    }
}
