pub mod google;
pub mod rakuten;
pub mod yahoo;

pub use google::GoogleProvider;
pub use rakuten::RakutenProvider;
pub use yahoo::YahooProvider;

use anyhow::Result;
use async_trait::async_trait;

use shoplens_common::{Config, Platform, ProductListing};

/// One upstream search provider. Implementations assign 1-based ranks in
/// response order and fix `platform` to their own identity; missing
/// optional payload fields map to empty/None, never to an error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn platform(&self) -> Platform;

    async fn search(&self, keyword: &str, limit: u32) -> Result<Vec<ProductListing>>;
}

/// Build the production providers in fixed declaration order: Rakuten,
/// Yahoo, Google. This order is the cross-platform ordering of every batch.
pub fn build_providers(config: &Config, client: &reqwest::Client) -> Vec<Box<dyn SearchProvider>> {
    vec![
        Box::new(RakutenProvider::new(
            config.rakuten_app_id.clone(),
            client.clone(),
        )),
        Box::new(YahooProvider::new(
            config.yahoo_app_id.clone(),
            client.clone(),
        )),
        Box::new(GoogleProvider::new(
            config.google_api_key.clone(),
            config.google_search_engine_id.clone(),
            client.clone(),
        )),
    ]
}
