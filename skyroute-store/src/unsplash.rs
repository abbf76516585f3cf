use async_trait::async_trait;
use reqwest::{header, Client};
use skyroute_core::{CoreError, CoreResult, DownloadTracker};
use skyroute_shared::Masked;
use tracing::{info, warn};
use url::Url;

use crate::app_config::UnsplashConfig;

#[derive(Clone)]
pub struct UnsplashClient {
    http: Client,
    api_host: String,
    access_key: Masked<String>,
}

impl UnsplashClient {
    pub fn new(config: &UnsplashConfig) -> Result<Self, CoreError> {
        let api_host = Url::parse(&config.api_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| CoreError::InternalError(format!("Invalid image API url: {}", config.api_url)))?;

        Ok(Self {
            http: Client::new(),
            api_host,
            access_key: config.access_key.clone(),
        })
    }
}

/// Only HTTPS links on the image API's own host are followed.
pub fn validate_download_location(location: &str, api_host: &str) -> CoreResult<Url> {
    let url = Url::parse(location.trim())
        .map_err(|_| CoreError::ValidationError("download_location must be a valid URL".to_string()))?;

    if url.scheme() != "https" || url.host_str() != Some(api_host) {
        return Err(CoreError::ValidationError(format!(
            "download_location must point to https://{api_host}"
        )));
    }
    Ok(url)
}

#[async_trait]
impl DownloadTracker for UnsplashClient {
    async fn track_download(&self, download_location: &str) -> CoreResult<()> {
        let url = validate_download_location(download_location, &self.api_host)?;

        let response = self
            .http
            .get(url.clone())
            .header(header::AUTHORIZATION, format!("Client-ID {}", self.access_key.expose()))
            .send()
            .await
            .map_err(|e| CoreError::UpstreamError(format!("Image API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Download tracking failed for {}: {}", url.path(), status);
            return Err(CoreError::UpstreamError(format!("Image API returned {status}")));
        }

        info!("Tracked photo download {}", url.path());
        Ok(())
    }
}
