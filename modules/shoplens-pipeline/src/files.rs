use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// Handle to a stored artifact.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub url: String,
}

/// Binary blob storage for capture artifacts and exported reports.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, name: &str, bytes: Bytes) -> Result<StoredFile>;
}

/// File store writing into a configured local directory, created on demand.
pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, name: &str, bytes: Bytes) -> Result<StoredFile> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create output dir {}", self.dir.display()))?;

        let path = self.dir.join(name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let abs = path
            .canonicalize()
            .unwrap_or_else(|_| path.clone());
        tracing::info!(file = %abs.display(), bytes = bytes.len(), "Stored artifact");

        Ok(StoredFile {
            name: name.to_string(),
            url: format!("file://{}", abs.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_blob_and_returns_url() {
        let dir = std::env::temp_dir().join(format!("shoplens-test-{}", std::process::id()));
        let store = LocalFileStore::new(&dir);
        let file = store
            .store("shot_1.pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(file.name, "shot_1.pdf");
        assert!(file.url.starts_with("file://"));
        let written = tokio::fs::read(dir.join("shot_1.pdf")).await.unwrap();
        assert_eq!(written, b"%PDF-1.4");
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
