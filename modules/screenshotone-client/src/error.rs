use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScreenshotOneError>;

#[derive(Debug, Error)]
pub enum ScreenshotOneError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Screenshot URL missing from response")]
    MissingArtifact,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ScreenshotOneError {
    fn from(err: reqwest::Error) -> Self {
        ScreenshotOneError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ScreenshotOneError {
    fn from(err: serde_json::Error) -> Self {
        ScreenshotOneError::Parse(err.to_string())
    }
}
