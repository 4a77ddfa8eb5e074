use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiffbotError>;

#[derive(Debug, Error)]
pub enum DiffbotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited (status 429): {0}")]
    RateLimited(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No product object in response")]
    NoObject,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for DiffbotError {
    fn from(err: reqwest::Error) -> Self {
        DiffbotError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DiffbotError {
    fn from(err: serde_json::Error) -> Self {
        DiffbotError::Parse(err.to_string())
    }
}
