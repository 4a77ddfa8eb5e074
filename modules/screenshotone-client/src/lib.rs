pub mod error;

pub use error::{Result, ScreenshotOneError};

use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;

const BASE_URL: &str = "https://api.screenshotone.com";

/// Overall render timeout requested from the provider, in seconds.
const RENDER_TIMEOUT_SECS: u32 = 60;
/// Navigation timeout requested from the provider, in seconds.
const NAVIGATION_TIMEOUT_SECS: u32 = 30;
/// Post-load settle delay so late JS and images land in the render.
const SETTLE_DELAY_SECS: u32 = 3;

pub struct ScreenshotOneClient {
    client: reqwest::Client,
    access_key: String,
}

#[derive(Debug, Deserialize)]
struct TakeResponse {
    screenshot_url: Option<String>,
    url: Option<String>,
    data: Option<TakeData>,
}

#[derive(Debug, Deserialize)]
struct TakeData {
    screenshot: Option<TakeScreenshot>,
}

#[derive(Debug, Deserialize)]
struct TakeScreenshot {
    url: Option<String>,
}

impl TakeResponse {
    fn artifact_url(self) -> Option<String> {
        self.screenshot_url
            .or(self.url)
            .or_else(|| self.data.and_then(|d| d.screenshot).and_then(|s| s.url))
    }
}

impl ScreenshotOneClient {
    pub fn new(access_key: String) -> Self {
        // The provider is given 60s to render; leave headroom on our side.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, access_key }
    }

    /// Request a full-page PDF render of `url` and return the artifact URL.
    /// The render options are fixed: ad blocking on, networkidle2 wait,
    /// explicit timeouts, a 3s settle delay, and a 1280x1024 viewport.
    pub async fn take(&self, url: &str) -> Result<String> {
        let endpoint = format!("{BASE_URL}/take");
        let resp = self
            .client
            .get(&endpoint)
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("url", url),
                ("full_page", "true"),
                ("format", "pdf"),
                ("block_ads", "true"),
                ("wait_until", "networkidle2"),
                ("timeout", &RENDER_TIMEOUT_SECS.to_string()),
                ("navigation_timeout", &NAVIGATION_TIMEOUT_SECS.to_string()),
                ("delay", &SETTLE_DELAY_SECS.to_string()),
                ("viewport_width", "1280"),
                ("viewport_height", "1024"),
                ("response_type", "json"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ScreenshotOneError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body: TakeResponse = serde_json::from_str(&resp.text().await?)?;
        body.artifact_url()
            .ok_or(ScreenshotOneError::MissingArtifact)
    }

    /// Download a rendered artifact.
    pub async fn download(&self, artifact_url: &str) -> Result<Bytes> {
        let resp = self.client.get(artifact_url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ScreenshotOneError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        Ok(resp.bytes().await?)
    }

    /// Render `url` and download the resulting PDF in one call.
    pub async fn capture_pdf(&self, url: &str) -> Result<Bytes> {
        let artifact_url = self.take(url).await?;
        tracing::debug!(url, artifact_url = %artifact_url, "Screenshot rendered, downloading");
        self.download(&artifact_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_url_prefers_top_level_fields() {
        let body: TakeResponse = serde_json::from_str(
            r#"{"screenshot_url":"https://cdn.example/a.pdf","url":"https://cdn.example/b.pdf"}"#,
        )
        .unwrap();
        assert_eq!(
            body.artifact_url().as_deref(),
            Some("https://cdn.example/a.pdf")
        );
    }

    #[test]
    fn artifact_url_falls_back_to_nested_shape() {
        let body: TakeResponse = serde_json::from_str(
            r#"{"data":{"screenshot":{"url":"https://cdn.example/c.pdf"}}}"#,
        )
        .unwrap();
        assert_eq!(
            body.artifact_url().as_deref(),
            Some("https://cdn.example/c.pdf")
        );
    }

    #[test]
    fn artifact_url_missing_is_none() {
        let body: TakeResponse = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert!(body.artifact_url().is_none());
    }
}
