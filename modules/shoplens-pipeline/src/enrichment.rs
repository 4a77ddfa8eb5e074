use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use diffbot_client::{DiffbotClient, ProductObject};
use shoplens_common::{
    discount_pct, format_number, is_http_url, truncate_chars, DetailRecord, Platform,
    MAX_IMAGES, MAX_REVIEW_EXCERPTS, REVIEW_EXCERPT_CHARS,
};

use crate::pacing::{Pacer, EXTRACTION_INTERVAL};
use crate::store::{RecordStore, COL_NAME, COL_PLATFORM, COL_RANK, COL_URL};

// Detail columns, appended to the batch schema on first enrichment run.
pub const COL_D_TITLE: &str = "D_Title";
pub const COL_D_PRICE: &str = "D_Price";
pub const COL_D_CURRENCY: &str = "D_Currency";
pub const COL_D_OLD_PRICE: &str = "D_OldPrice";
pub const COL_D_DISCOUNT_PCT: &str = "D_DiscountPct";
pub const COL_D_BRAND: &str = "D_Brand";
pub const COL_D_SKU: &str = "D_Sku";
pub const COL_D_SELLER: &str = "D_Seller";
pub const COL_D_RATING: &str = "D_Rating";
pub const COL_D_REVIEW_COUNT: &str = "D_ReviewCount";
pub const COL_D_AVAILABILITY: &str = "D_Availability";
pub const COL_D_CATEGORY: &str = "D_Category";
pub const COL_D_MAIN_IMAGE: &str = "D_MainImage";
pub const COL_D_REVIEWS: &str = "D_Reviews";
pub const COL_D_ERROR: &str = "D_Error";
pub const COL_D_FETCHED_AT: &str = "D_FetchedAt";

const DETAIL_COLUMNS: [&str; 16] = [
    COL_D_TITLE,
    COL_D_PRICE,
    COL_D_CURRENCY,
    COL_D_OLD_PRICE,
    COL_D_DISCOUNT_PCT,
    COL_D_BRAND,
    COL_D_SKU,
    COL_D_SELLER,
    COL_D_RATING,
    COL_D_REVIEW_COUNT,
    COL_D_AVAILABILITY,
    COL_D_CATEGORY,
    COL_D_MAIN_IMAGE,
    COL_D_REVIEWS,
    COL_D_ERROR,
    COL_D_FETCHED_AT,
];

/// Prefix of the per-row error cell.
pub const ERROR_PREFIX: &str = "ERR: ";
/// Character budget of the per-row error cell.
const ERROR_CHARS: usize = 200;

/// A row enriched within this window is skipped without a call or a write;
/// exactly at the boundary it is re-attempted.
pub fn freshness_window() -> Duration {
    Duration::days(7)
}

/// Only listings from the web-search category get deep enrichment; the
/// marketplace categories already carry structured data.
pub const ENRICHED_PLATFORM: Platform = Platform::GoogleSearch;

/// External detail-extraction operation for one product URL.
#[async_trait]
pub trait ProductExtractor: Send + Sync {
    async fn product(&self, url: &str) -> Result<ProductObject>;
}

#[async_trait]
impl ProductExtractor for DiffbotClient {
    async fn product(&self, url: &str) -> Result<ProductObject> {
        Ok(DiffbotClient::product(self, url).await?)
    }
}

/// Per-row outcome of one enrichment run, in store order. Threaded into the
/// report compiler as a return value; the report never re-reads the store.
#[derive(Debug, Clone)]
pub struct EnrichedRow {
    pub rank: u32,
    pub title: String,
    pub url: String,
    pub outcome: std::result::Result<DetailRecord, String>,
}

#[derive(Debug, Default)]
pub struct EnrichmentStats {
    pub attempted: u32,
    pub enriched: u32,
    pub failed: u32,
    pub skipped_fresh: u32,
}

pub struct EnrichmentEngine {
    pacer: Pacer,
}

impl EnrichmentEngine {
    pub fn new() -> Self {
        Self {
            pacer: Pacer::new(EXTRACTION_INTERVAL),
        }
    }

    /// Enrich every eligible, stale row. Per-row failures are recorded as
    /// data and never abort the loop.
    pub async fn run(
        &mut self,
        store: &mut dyn RecordStore,
        extractor: &dyn ProductExtractor,
    ) -> Result<Vec<EnrichedRow>> {
        for col in DETAIL_COLUMNS {
            store
                .ensure_column(col)
                .await
                .with_context(|| format!("Failed to ensure column {col}"))?;
        }

        let mut outcomes = Vec::new();
        let mut stats = EnrichmentStats::default();

        let rows = store.row_count().await?;
        for row in 1..=rows {
            if Platform::parse(&store.read_cell(row, COL_PLATFORM).await?)
                != Some(ENRICHED_PLATFORM)
            {
                continue;
            }
            let url = store.read_cell(row, COL_URL).await?;
            if !is_http_url(&url) {
                continue;
            }

            let now = Utc::now();
            if let Some(fetched_at) = parse_timestamp(&store.read_cell(row, COL_D_FETCHED_AT).await?)
            {
                if now - fetched_at < freshness_window() {
                    stats.skipped_fresh += 1;
                    continue;
                }
            }

            self.pacer.wait().await;
            stats.attempted += 1;

            let rank = store
                .read_cell(row, COL_RANK)
                .await?
                .parse()
                .unwrap_or_default();
            let title = store.read_cell(row, COL_NAME).await?;

            let outcome = match extractor.product(&url).await {
                Ok(obj) => {
                    let record = normalize(obj, now);
                    write_detail(store, row, &record).await?;
                    stats.enriched += 1;
                    info!(row, url = %url, "Row enriched");
                    Ok(record)
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(row, url = %url, error = %reason, "Enrichment failed");
                    let cell = format!(
                        "{ERROR_PREFIX}{}",
                        truncate_chars(&reason, ERROR_CHARS)
                    );
                    // Only the error cell and the freshness stamp are
                    // written; prior detail columns stay as they were.
                    store.write_cell(row, COL_D_ERROR, &cell).await?;
                    store
                        .write_cell(row, COL_D_FETCHED_AT, &now.to_rfc3339())
                        .await?;
                    stats.failed += 1;
                    Err(reason)
                }
            };

            outcomes.push(EnrichedRow {
                rank,
                title,
                url,
                outcome,
            });
        }

        info!(
            attempted = stats.attempted,
            enriched = stats.enriched,
            failed = stats.failed,
            skipped_fresh = stats.skipped_fresh,
            "Enrichment stage complete"
        );
        Ok(outcomes)
    }
}

impl Default for EnrichmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(cell)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Normalize a heterogeneous extraction payload into a `DetailRecord`.
pub fn normalize(obj: ProductObject, now: DateTime<Utc>) -> DetailRecord {
    let price = obj.best_price();
    let old_price = obj.regular_price_value();

    let currency = obj.price_currency.clone().or_else(|| {
        obj.offer_price_details
            .as_ref()
            .and_then(|d| d.symbol.clone())
    });

    let review_excerpts: Vec<String> = obj
        .reviews
        .iter()
        .filter_map(|r| r.text.as_deref())
        .filter(|t| !t.is_empty())
        .take(MAX_REVIEW_EXCERPTS)
        .map(|t| truncate_chars(t, REVIEW_EXCERPT_CHARS))
        .collect();

    let images: Vec<String> = obj
        .images
        .iter()
        .filter_map(|i| i.url.clone())
        .take(MAX_IMAGES)
        .collect();

    DetailRecord {
        title: obj.title.clone(),
        brand: obj.brand.clone(),
        sku: obj.sku.clone(),
        seller: obj.seller.clone(),
        category: obj.category_path(),
        availability: obj.availability.as_ref().map(|a| a.in_stock()),
        discount_pct: discount_pct(price, old_price),
        price,
        currency,
        old_price,
        rating: obj.aggregate_rating.as_ref().and_then(|r| r.value),
        review_count: obj.aggregate_rating.as_ref().and_then(|r| r.count),
        review_excerpts,
        main_image: images.first().cloned(),
        images,
        variant_count: (!obj.variants.is_empty()).then_some(obj.variants.len()),
        fetched_at: now,
    }
}

/// Write a successful detail record into its columns, clear any prior
/// error, and stamp freshness.
async fn write_detail(store: &mut dyn RecordStore, row: usize, record: &DetailRecord) -> Result<()> {
    let cells = [
        (COL_D_TITLE, record.title.clone().unwrap_or_default()),
        (
            COL_D_PRICE,
            record.price.map(format_number).unwrap_or_default(),
        ),
        (COL_D_CURRENCY, record.currency.clone().unwrap_or_default()),
        (
            COL_D_OLD_PRICE,
            record.old_price.map(format_number).unwrap_or_default(),
        ),
        (
            COL_D_DISCOUNT_PCT,
            record
                .discount_pct
                .map(|d| d.to_string())
                .unwrap_or_default(),
        ),
        (COL_D_BRAND, record.brand.clone().unwrap_or_default()),
        (COL_D_SKU, record.sku.clone().unwrap_or_default()),
        (COL_D_SELLER, record.seller.clone().unwrap_or_default()),
        (
            COL_D_RATING,
            record.rating.map(format_number).unwrap_or_default(),
        ),
        (
            COL_D_REVIEW_COUNT,
            record
                .review_count
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ),
        (
            COL_D_AVAILABILITY,
            record
                .availability
                .map(|a| if a { "in stock" } else { "out of stock" }.to_string())
                .unwrap_or_default(),
        ),
        (COL_D_CATEGORY, record.category.clone().unwrap_or_default()),
        (
            COL_D_MAIN_IMAGE,
            record.main_image.clone().unwrap_or_default(),
        ),
        (COL_D_REVIEWS, record.review_excerpts.join(" | ")),
        (COL_D_ERROR, String::new()),
        (COL_D_FETCHED_AT, record.fetched_at.to_rfc3339()),
    ];

    for (col, value) in cells {
        store.write_cell(row, col, &value).await?;
    }
    Ok(())
}
