use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::info;

use shoplens_common::{Platform, ProductListing};

use crate::adapters::SearchProvider;

/// Result count requested from every provider.
pub const SEARCH_LIMIT: u32 = 10;

/// One aggregation run: the concatenated listings plus per-platform counts.
#[derive(Debug)]
pub struct AggregateBatch {
    pub listings: Vec<ProductListing>,
    pub counts: HashMap<Platform, usize>,
}

impl AggregateBatch {
    pub fn total(&self) -> usize {
        self.listings.len()
    }
}

/// Runs every source adapter for one keyword and concatenates their outputs
/// in adapter-declaration order. Intra-platform ordering is the adapter's
/// returned rank; there is no cross-platform re-ranking.
pub struct Aggregator {
    providers: Vec<Box<dyn SearchProvider>>,
}

impl Aggregator {
    pub fn new(providers: Vec<Box<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    pub async fn aggregate(&self, keyword: &str) -> Result<AggregateBatch> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            anyhow::bail!("Keyword is empty");
        }

        let mut listings = Vec::new();
        let mut counts = HashMap::new();

        for provider in &self.providers {
            let platform = provider.platform();
            let items = provider
                .search(keyword, SEARCH_LIMIT)
                .await
                .with_context(|| format!("Search failed for {platform}"))?;

            info!(platform = %platform, count = items.len(), "Provider results");
            counts.insert(platform, items.len());
            listings.extend(items);
        }

        info!(keyword, total = listings.len(), "Aggregation complete");
        Ok(AggregateBatch { listings, counts })
    }
}
