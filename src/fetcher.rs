//! Remote CDN cache purge for deployments that serve `/cache` from an edge.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{info, warn};

use crate::error::CodeMapperError;
use crate::state::PurgeSettings;

const VERCEL_API_URL: &str = "https://api.vercel.com";
const PURGE_PATH: &str = "/cache/*";

/// Endpoint that invalidates the project's edge cache.
pub fn purge_endpoint(api_base: &str, project_id: &str) -> String {
    format!(
        "{}/v9/projects/{}/cache",
        api_base.trim_end_matches('/'),
        project_id
    )
}

/// Asks the hosting provider to drop every cached country file.
///
/// # Errors
///
/// Returns `CodeMapperError::InvalidHeader` for a token that is not a valid
/// header value, `CodeMapperError::HttpRequest` on transport failures, and
/// `CodeMapperError::InvalidApiResponse` for a non-success status.
pub async fn purge_remote_cache(settings: &PurgeSettings) -> Result<(), CodeMapperError> {
    purge_remote_cache_at(VERCEL_API_URL, settings).await
}

pub(crate) async fn purge_remote_cache_at(
    api_base: &str,
    settings: &PurgeSettings,
) -> Result<(), CodeMapperError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("CodeMapper/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", settings.token))?,
    );

    let url = purge_endpoint(api_base, &settings.project_id);
    info!(
        "Purging {} for deployment {} via {}",
        PURGE_PATH, settings.deployment_url, url
    );

    let response = client
        .post(&url)
        .headers(headers)
        .json(&serde_json::json!({ "path": PURGE_PATH }))
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        info!("Successfully purged cache directory");
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        warn!("Failed to purge cache: {} - {}", status, body);
        Err(CodeMapperError::InvalidApiResponse(format!(
            "cache purge returned {status}: {body}"
        )))
    }
}
