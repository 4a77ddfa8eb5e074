use anyhow::Result;
use async_trait::async_trait;

use shoplens_common::{format_number, ProductListing};

// Base column names written by the aggregation stage. Later stages append
// their own columns after these.
pub const COL_COLLECTED_AT: &str = "CollectedAt";
pub const COL_PLATFORM: &str = "Platform";
pub const COL_RANK: &str = "Rank";
pub const COL_NAME: &str = "Name";
pub const COL_PRICE: &str = "Price";
pub const COL_URL: &str = "URL";
pub const COL_SHOP: &str = "Shop";
pub const COL_REVIEW_COUNT: &str = "ReviewCount";
pub const COL_REVIEW_AVG: &str = "ReviewAvg";
pub const COL_SCREENSHOT_URL: &str = "ScreenshotURL";
pub const COL_DESCRIPTION: &str = "Description";

pub const BASE_HEADER: [&str; 11] = [
    COL_COLLECTED_AT,
    COL_PLATFORM,
    COL_RANK,
    COL_NAME,
    COL_PRICE,
    COL_URL,
    COL_SHOP,
    COL_REVIEW_COUNT,
    COL_REVIEW_AVG,
    COL_SCREENSHOT_URL,
    COL_DESCRIPTION,
];

/// Index sentinel for "column not present", distinguishable from any valid
/// 1-based index.
pub const NO_COLUMN: usize = 0;

/// Ordered-row, named-column tabular store for one batch. Row 1 of the
/// underlying sheet is the header; data rows here are 1-based. Columns are
/// append-only: once created at a position they never move or disappear for
/// the lifetime of the batch.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Ordered column names.
    async fn header(&self) -> Result<Vec<String>>;

    /// 1-based index of `name`, appending a new column at the end if
    /// absent. Exactly one column exists per distinct name.
    async fn ensure_column(&mut self, name: &str) -> Result<usize>;

    /// 1-based index of `name`, or [`NO_COLUMN`] when not present.
    async fn column_index(&self, name: &str) -> Result<usize>;

    async fn append_rows(&mut self, rows: Vec<Vec<String>>) -> Result<()>;

    async fn row_count(&self) -> Result<usize>;

    /// Read data row `row` (1-based), padded to header width.
    async fn read_row(&self, row: usize) -> Result<Vec<String>>;

    /// Read one cell by column name. An unknown column is "not present",
    /// not an error: the empty string is returned.
    async fn read_cell(&self, row: usize, column: &str) -> Result<String>;

    /// Write one cell by column name. The column must already exist.
    async fn write_cell(&mut self, row: usize, column: &str, value: &str) -> Result<()>;
}

/// Serialize a listing into a base-header row. The screenshot cell starts
/// empty; the capture stage fills it later.
pub fn listing_row(listing: &ProductListing) -> Vec<String> {
    vec![
        listing.collected_at.to_rfc3339(),
        listing.platform.as_str().to_string(),
        listing.rank.to_string(),
        listing.name.clone(),
        listing.price.map(format_number).unwrap_or_default(),
        listing.url.clone(),
        listing.shop_name.clone(),
        listing
            .review_count
            .map(|n| n.to_string())
            .unwrap_or_default(),
        listing.review_avg.map(format_number).unwrap_or_default(),
        String::new(),
        listing.description.clone(),
    ]
}

// --- In-memory implementation ---

/// In-memory record store. Backs the batch during a pipeline run and serves
/// as the test double; a spreadsheet-backed implementation would live
/// behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MemoryStore {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn with_base_header() -> Self {
        Self::new(BASE_HEADER.iter().map(|s| s.to_string()).collect())
    }

    fn index_of(&self, name: &str) -> usize {
        self.header
            .iter()
            .position(|h| h == name)
            .map(|i| i + 1)
            .unwrap_or(NO_COLUMN)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn header(&self) -> Result<Vec<String>> {
        Ok(self.header.clone())
    }

    async fn ensure_column(&mut self, name: &str) -> Result<usize> {
        let idx = self.index_of(name);
        if idx != NO_COLUMN {
            return Ok(idx);
        }
        self.header.push(name.to_string());
        Ok(self.header.len())
    }

    async fn column_index(&self, name: &str) -> Result<usize> {
        Ok(self.index_of(name))
    }

    async fn append_rows(&mut self, rows: Vec<Vec<String>>) -> Result<()> {
        self.rows.extend(rows);
        Ok(())
    }

    async fn row_count(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    async fn read_row(&self, row: usize) -> Result<Vec<String>> {
        let r = self
            .rows
            .get(row.checked_sub(1).ok_or_else(|| anyhow::anyhow!("Row index is 1-based"))?)
            .ok_or_else(|| anyhow::anyhow!("Row {row} out of range"))?;
        let mut out = r.clone();
        out.resize(self.header.len(), String::new());
        Ok(out)
    }

    async fn read_cell(&self, row: usize, column: &str) -> Result<String> {
        let idx = self.index_of(column);
        if idx == NO_COLUMN {
            return Ok(String::new());
        }
        let r = self.read_row(row).await?;
        Ok(r[idx - 1].clone())
    }

    async fn write_cell(&mut self, row: usize, column: &str, value: &str) -> Result<()> {
        let idx = self.index_of(column);
        if idx == NO_COLUMN {
            anyhow::bail!("Unknown column: {column}");
        }
        let r = self
            .rows
            .get_mut(row.checked_sub(1).ok_or_else(|| anyhow::anyhow!("Row index is 1-based"))?)
            .ok_or_else(|| anyhow::anyhow!("Row {row} out of range"))?;
        if r.len() < idx {
            r.resize(idx, String::new());
        }
        r[idx - 1] = value.to_string();
        Ok(())
    }
}
