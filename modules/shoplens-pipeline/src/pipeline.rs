use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use diffbot_client::DiffbotClient;
use screenshotone_client::ScreenshotOneClient;
use shoplens_common::{Config, Platform};

use crate::adapters::build_providers;
use crate::aggregator::Aggregator;
use crate::capture::{CaptureScheduler, CaptureStats, Capturer};
use crate::enrichment::{EnrichmentEngine, ProductExtractor};
use crate::files::{FileStore, LocalFileStore, StoredFile};
use crate::report::{self, ReportDocument, ReportRenderer};
use crate::store::{listing_row, MemoryStore, RecordStore};

/// Report export seam. The production implementation renders PDF; tests
/// swap in a recorder.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    async fn export(&self, document: ReportDocument, files: &dyn FileStore)
        -> Result<StoredFile>;
}

#[async_trait]
impl ReportExporter for ReportRenderer {
    async fn export(
        &self,
        document: ReportDocument,
        files: &dyn FileStore,
    ) -> Result<StoredFile> {
        ReportRenderer::export(self, document, files).await
    }
}

/// Summary of one full pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub total_listings: usize,
    pub counts: HashMap<Platform, usize>,
    pub capture: CaptureStats,
    pub enriched_rows: usize,
    pub report: StoredFile,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== ShopLens Run Complete ===")?;
        writeln!(f, "Listings:        {}", self.total_listings)?;
        for platform in Platform::all() {
            writeln!(
                f,
                "  {:<15} {}",
                format!("{platform}:"),
                self.counts.get(&platform).unwrap_or(&0)
            )?;
        }
        writeln!(f, "Captures:        {} ok, {} failed", self.capture.captured, self.capture.failed)?;
        writeln!(f, "Enriched rows:   {}", self.enriched_rows)?;
        write!(f, "Report:          {}", self.report.url)
    }
}

/// Runs the stages in strict sequence for one keyword: aggregate, populate
/// the store, capture, enrich, compile and export the report. The store is
/// single-writer throughout; there is no feedback loop between stages.
pub struct Pipeline {
    aggregator: Aggregator,
    capturer: Box<dyn Capturer>,
    extractor: Box<dyn ProductExtractor>,
    files: Box<dyn FileStore>,
    exporter: Box<dyn ReportExporter>,
}

impl Pipeline {
    pub fn new(
        aggregator: Aggregator,
        capturer: Box<dyn Capturer>,
        extractor: Box<dyn ProductExtractor>,
        files: Box<dyn FileStore>,
        exporter: Box<dyn ReportExporter>,
    ) -> Self {
        Self {
            aggregator,
            capturer,
            extractor,
            files,
            exporter,
        }
    }

    /// Wire up the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::new();
        Self::new(
            Aggregator::new(build_providers(config, &client)),
            Box::new(ScreenshotOneClient::new(
                config.screenshotone_access_key.clone(),
            )),
            Box::new(DiffbotClient::new(config.diffbot_token.clone())),
            Box::new(LocalFileStore::new(config.output_dir.clone())),
            Box::new(ReportRenderer::new(config.font_dir.clone())),
        )
    }

    pub async fn run(&self, keyword: &str) -> Result<RunSummary> {
        info!(keyword, "Starting pipeline run");

        let batch = self
            .aggregator
            .aggregate(keyword)
            .await
            .context("Aggregation failed")?;

        let mut store = MemoryStore::with_base_header();
        store
            .append_rows(batch.listings.iter().map(listing_row).collect())
            .await
            .context("Failed to populate record store")?;
        info!(rows = batch.total(), "Batch stored");

        let capture = CaptureScheduler::new()
            .run(&mut store, self.capturer.as_ref(), self.files.as_ref())
            .await
            .context("Capture stage failed")?;

        let outcomes = EnrichmentEngine::new()
            .run(&mut store, self.extractor.as_ref())
            .await
            .context("Enrichment stage failed")?;

        let document = report::compile(keyword, &outcomes);
        let report = self
            .exporter
            .export(document, self.files.as_ref())
            .await
            .context("Report export failed")?;

        Ok(RunSummary {
            total_listings: batch.total(),
            counts: batch.counts,
            capture,
            enriched_rows: outcomes.len(),
            report,
        })
    }
}
