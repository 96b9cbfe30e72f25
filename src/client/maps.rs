//! Google Static Maps client: one venue map image per location page.
//!
//! The map is only ever a *reference image* for the image model — it is
//! never returned to the caller directly — so a fetch failure is not
//! fatal: the pipeline logs it and generates the location page without a
//! map.

use crate::client::ReferenceImage;
use crate::error::WedcardError;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Client for static venue maps.
#[derive(Debug, Clone)]
pub struct StaticMapClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl StaticMapClient {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, WedcardError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| WedcardError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (local test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch a 600×400 map centred on the venue with a single marker.
    pub async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        venue_name: &str,
    ) -> Result<ReferenceImage, WedcardError> {
        let label = venue_name.chars().next().unwrap_or('W');
        let url = format!(
            "{}?center={latitude},{longitude}&zoom=16&size=600x400\
             &markers=color:red%7Clabel:{label}%7C{latitude},{longitude}&key={}",
            self.base_url, self.api_key,
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| WedcardError::ProviderUnavailable {
                provider: "maps",
                attempts: 1,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WedcardError::ProviderRejected {
                provider: "maps",
                message: format!("HTTP {status}: {body}"),
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| WedcardError::ProviderUnavailable {
                provider: "maps",
                attempts: 1,
                detail: e.to_string(),
            })?
            .to_vec();

        if data.is_empty() {
            return Err(WedcardError::EmptyModelPayload {
                provider: "maps",
                detail: "empty map image body".into(),
            });
        }

        debug!(bytes = data.len(), "fetched venue map");
        Ok(ReferenceImage {
            mime_type: "image/png".to_string(),
            data,
        })
    }
}
