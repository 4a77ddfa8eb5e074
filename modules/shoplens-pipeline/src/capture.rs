use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use screenshotone_client::ScreenshotOneClient;
use shoplens_common::{is_http_url, Platform};

use crate::files::FileStore;
use crate::pacing::{Pacer, CAPTURE_INTERVAL};
use crate::store::{RecordStore, COL_PLATFORM, COL_RANK, COL_SCREENSHOT_URL, COL_URL};

/// Fixed failure sentinel written to the capture cell when an attempt
/// fails. Absence of any value means "not attempted or not eligible".
pub const CAPTURE_FAILED_SENTINEL: &str = "SKIP: capture failed";

/// Only the top-ranked listings are captured.
pub const TOP_RANK: u32 = 3;

/// Per-platform cap on successful captures per run. In-memory only, never
/// persisted across runs.
pub const QUOTA_PER_PLATFORM: u32 = 3;

/// External visual-capture operation: a full-page PDF render of one URL.
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture_pdf(&self, url: &str) -> Result<Bytes>;
}

#[async_trait]
impl Capturer for ScreenshotOneClient {
    async fn capture_pdf(&self, url: &str) -> Result<Bytes> {
        Ok(ScreenshotOneClient::capture_pdf(self, url).await?)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub attempted: u32,
    pub captured: u32,
    pub failed: u32,
}

pub struct CaptureScheduler {
    pacer: Pacer,
}

impl CaptureScheduler {
    pub fn new() -> Self {
        Self {
            pacer: Pacer::new(CAPTURE_INTERVAL),
        }
    }

    /// Capture the top-ranked rows of each platform. Per-row failures write
    /// the sentinel and continue; a single bad URL never aborts the batch.
    pub async fn run(
        &mut self,
        store: &mut dyn RecordStore,
        capturer: &dyn Capturer,
        files: &dyn FileStore,
    ) -> Result<CaptureStats> {
        store
            .ensure_column(COL_SCREENSHOT_URL)
            .await
            .context("Failed to ensure screenshot column")?;

        let mut quota: HashMap<Platform, u32> = HashMap::new();
        let mut stats = CaptureStats::default();

        let rows = store.row_count().await?;
        for row in 1..=rows {
            let platform = match Platform::parse(&store.read_cell(row, COL_PLATFORM).await?) {
                Some(p) => p,
                None => continue,
            };
            let rank: u32 = match store.read_cell(row, COL_RANK).await?.parse() {
                Ok(r) if (1..=TOP_RANK).contains(&r) => r,
                _ => continue,
            };
            if *quota.get(&platform).unwrap_or(&0) >= QUOTA_PER_PLATFORM {
                continue;
            }
            let url = store.read_cell(row, COL_URL).await?;
            if !is_http_url(&url) {
                continue;
            }

            self.pacer.wait().await;
            stats.attempted += 1;

            let target = strip_query(&url);
            match self.capture_row(row, &target, capturer, files).await {
                Ok(stored_url) => {
                    store.write_cell(row, COL_SCREENSHOT_URL, &stored_url).await?;
                    *quota.entry(platform).or_insert(0) += 1;
                    stats.captured += 1;
                    info!(row, platform = %platform, rank, "Screenshot captured");
                }
                Err(e) => {
                    warn!(row, url = %target, error = %e, "Screenshot failed");
                    store
                        .write_cell(row, COL_SCREENSHOT_URL, CAPTURE_FAILED_SENTINEL)
                        .await?;
                    stats.failed += 1;
                }
            }
        }

        info!(
            attempted = stats.attempted,
            captured = stats.captured,
            failed = stats.failed,
            "Capture stage complete"
        );
        Ok(stats)
    }

    async fn capture_row(
        &self,
        row: usize,
        url: &str,
        capturer: &dyn Capturer,
        files: &dyn FileStore,
    ) -> Result<String> {
        let bytes = capturer.capture_pdf(url).await?;
        let name = format!("shot_{}_{row}.pdf", Utc::now().timestamp_millis());
        let stored = files.store(&name, bytes).await?;
        Ok(stored.url)
    }
}

impl Default for CaptureScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop query parameters so volatile tracking parameters do not destabilize
/// capture requests.
fn strip_query(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut u) => {
            u.set_query(None);
            u.to_string()
        }
        Err(_) => url.split('?').next().unwrap_or(url).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::files::StoredFile;
    use crate::store::{listing_row, MemoryStore};
    use chrono::Utc;
    use shoplens_common::ProductListing;

    struct FakeCapturer {
        calls: Mutex<Vec<String>>,
        fail_on: Vec<String>,
    }

    impl FakeCapturer {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Vec::new(),
            }
        }

        fn failing_on(urls: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: urls.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Capturer for FakeCapturer {
        async fn capture_pdf(&self, url: &str) -> Result<Bytes> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.fail_on.iter().any(|f| url == f) {
                anyhow::bail!("render timeout");
            }
            Ok(Bytes::from_static(b"%PDF-1.4"))
        }
    }

    struct FakeFiles;

    #[async_trait]
    impl FileStore for FakeFiles {
        async fn store(&self, name: &str, _bytes: Bytes) -> Result<StoredFile> {
            Ok(StoredFile {
                name: name.to_string(),
                url: format!("file:///fake/{name}"),
            })
        }
    }

    fn listing(platform: Platform, rank: u32, url: &str) -> ProductListing {
        ProductListing {
            platform,
            rank,
            collected_at: Utc::now(),
            name: format!("{platform}-{rank}"),
            price: None,
            url: url.to_string(),
            shop_name: String::new(),
            review_count: None,
            review_avg: None,
            description: String::new(),
        }
    }

    async fn store_with(listings: Vec<ProductListing>) -> MemoryStore {
        let mut store = MemoryStore::with_base_header();
        store
            .append_rows(listings.iter().map(listing_row).collect())
            .await
            .unwrap();
        store
    }

    #[tokio::test(start_paused = true)]
    async fn captures_only_top_ranked_rows() {
        let listings = (1..=5)
            .map(|rank| {
                listing(
                    Platform::Rakuten,
                    rank,
                    &format!("https://item.rakuten.co.jp/x/{rank}"),
                )
            })
            .collect();
        let mut store = store_with(listings).await;
        let capturer = FakeCapturer::new();

        let stats = CaptureScheduler::new()
            .run(&mut store, &capturer, &FakeFiles)
            .await
            .unwrap();

        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.captured, 3);
        assert_eq!(capturer.calls().len(), 3);
        // Rows beyond rank 3 are untouched.
        assert_eq!(store.read_cell(4, COL_SCREENSHOT_URL).await.unwrap(), "");
        assert_eq!(store.read_cell(5, COL_SCREENSHOT_URL).await.unwrap(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn quota_caps_successful_captures_per_platform() {
        // Two batches concatenated for the same platform give duplicate
        // top ranks; the per-platform quota still caps the run at 3.
        let listings = vec![
            listing(Platform::Rakuten, 1, "https://a.example/1"),
            listing(Platform::Rakuten, 2, "https://a.example/2"),
            listing(Platform::Rakuten, 3, "https://a.example/3"),
            listing(Platform::Rakuten, 1, "https://a.example/4"),
            listing(Platform::Rakuten, 2, "https://a.example/5"),
            listing(Platform::YahooShopping, 1, "https://b.example/1"),
        ];
        let mut store = store_with(listings).await;
        let capturer = FakeCapturer::new();

        let stats = CaptureScheduler::new()
            .run(&mut store, &capturer, &FakeFiles)
            .await
            .unwrap();

        assert_eq!(stats.captured, 4); // 3 rakuten + 1 yahoo
        assert_eq!(store.read_cell(4, COL_SCREENSHOT_URL).await.unwrap(), "");
        assert_eq!(store.read_cell(5, COL_SCREENSHOT_URL).await.unwrap(), "");
        assert!(store
            .read_cell(6, COL_SCREENSHOT_URL)
            .await
            .unwrap()
            .starts_with("file://"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_writes_sentinel_and_continues() {
        let listings = vec![
            listing(Platform::GoogleSearch, 1, "https://a.example/1"),
            listing(Platform::GoogleSearch, 2, "https://a.example/2"),
            listing(Platform::GoogleSearch, 3, "https://a.example/3"),
        ];
        let mut store = store_with(listings).await;
        let capturer = FakeCapturer::failing_on(&["https://a.example/2"]);

        let stats = CaptureScheduler::new()
            .run(&mut store, &capturer, &FakeFiles)
            .await
            .unwrap();

        assert_eq!(stats, CaptureStats { attempted: 3, captured: 2, failed: 1 });
        assert_eq!(
            store.read_cell(2, COL_SCREENSHOT_URL).await.unwrap(),
            CAPTURE_FAILED_SENTINEL
        );
        assert!(store
            .read_cell(3, COL_SCREENSHOT_URL)
            .await
            .unwrap()
            .starts_with("file://"));
    }

    #[tokio::test(start_paused = true)]
    async fn skips_invalid_urls_and_unknown_platforms() {
        let listings = vec![
            listing(Platform::Rakuten, 1, "not-a-url"),
            listing(Platform::Rakuten, 2, "ftp://a.example/x"),
            listing(Platform::Rakuten, 3, "https://a.example/ok"),
        ];
        let mut store = store_with(listings).await;
        store.write_cell(3, COL_PLATFORM, "unknown_mall").await.unwrap();
        let capturer = FakeCapturer::new();

        let stats = CaptureScheduler::new()
            .run(&mut store, &capturer, &FakeFiles)
            .await
            .unwrap();

        assert_eq!(stats.attempted, 0);
        assert_eq!(store.read_cell(1, COL_SCREENSHOT_URL).await.unwrap(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn strips_query_parameters_before_capture() {
        let listings = vec![listing(
            Platform::GoogleSearch,
            1,
            "https://shop.example/item/9?utm_source=feed&session=abc",
        )];
        let mut store = store_with(listings).await;
        let capturer = FakeCapturer::new();

        CaptureScheduler::new()
            .run(&mut store, &capturer, &FakeFiles)
            .await
            .unwrap();

        assert_eq!(capturer.calls(), vec!["https://shop.example/item/9"]);
    }
}
