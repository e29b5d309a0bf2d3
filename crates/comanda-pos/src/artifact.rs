//! Storage for screenshots captured during order insertion.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PosError;

/// Destination for captured screenshots.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn store_screenshot(
        &self,
        captured_at: DateTime<Utc>,
        png: &[u8],
    ) -> Result<(), PosError>;
}

#[derive(Serialize)]
struct ScreenshotPayload {
    captured_at: DateTime<Utc>,
    screenshot_b64: String,
}

/// Posts screenshots to an HTTP endpoint as base64-encoded JSON.
pub struct HttpArtifactSink {
    http: reqwest::Client,
    url: String,
}

impl HttpArtifactSink {
    /// # Errors
    ///
    /// Returns [`PosError::Http`] when the HTTP client cannot be built.
    pub fn new(url: &str) -> Result<Self, PosError> {
        let http = reqwest::Client::builder().build()?;
        Ok(HttpArtifactSink {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ArtifactSink for HttpArtifactSink {
    async fn store_screenshot(
        &self,
        captured_at: DateTime<Utc>,
        png: &[u8],
    ) -> Result<(), PosError> {
        let payload = ScreenshotPayload {
            captured_at,
            screenshot_b64: STANDARD.encode(png),
        };
        let response = self.http.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PosError::Sync {
                endpoint: self.url.clone(),
                status: status.as_u16(),
            });
        }
        tracing::debug!(url = %self.url, bytes = png.len(), "screenshot stored");
        Ok(())
    }
}
