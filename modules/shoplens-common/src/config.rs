use std::env;

use crate::error::ShopLensError;

/// Application configuration loaded once from environment variables at
/// process start. Missing mandatory credentials fail here, before any
/// network call is made.
#[derive(Debug, Clone)]
pub struct Config {
    // Search providers
    pub rakuten_app_id: String,
    pub yahoo_app_id: String,
    /// Optional: absence degrades the Google adapter to zero results.
    pub google_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,

    // Capture
    pub screenshotone_access_key: String,

    // Detail extraction
    pub diffbot_token: String,

    // File storage
    pub output_dir: String,
    /// Directory holding the .ttf family used by the PDF renderer.
    pub font_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ShopLensError> {
        Ok(Self {
            rakuten_app_id: required_env("RAKUTEN_APP_ID")?,
            yahoo_app_id: required_env("YAHOO_APP_ID")?,
            google_api_key: optional_env("GOOGLE_API_KEY"),
            google_search_engine_id: optional_env("GOOGLE_SEARCH_ENGINE_ID"),
            screenshotone_access_key: required_env("SCREENSHOTONE_ACCESS_KEY")?,
            diffbot_token: required_env("DIFFBOT_TOKEN")?,
            output_dir: env::var("SHOPLENS_OUTPUT_DIR").unwrap_or_else(|_| "./output".to_string()),
            font_dir: env::var("SHOPLENS_FONT_DIR").unwrap_or_else(|_| "./fonts".to_string()),
        })
    }

    /// Log the loaded configuration without leaking secrets.
    pub fn log_redacted(&self) {
        tracing::info!(
            rakuten = %redact(&self.rakuten_app_id),
            yahoo = %redact(&self.yahoo_app_id),
            google = self.google_api_key.is_some() && self.google_search_engine_id.is_some(),
            screenshotone = %redact(&self.screenshotone_access_key),
            diffbot = %redact(&self.diffbot_token),
            output_dir = %self.output_dir,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> Result<String, ShopLensError> {
    optional_env(key)
        .ok_or_else(|| ShopLensError::Config(format!("{key} environment variable is required")))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}…")
}
