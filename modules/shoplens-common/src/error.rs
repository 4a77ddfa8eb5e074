use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopLensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
