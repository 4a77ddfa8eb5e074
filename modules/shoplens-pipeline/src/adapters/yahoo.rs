use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use shoplens_common::{Platform, ProductListing};

use super::SearchProvider;

const ITEM_API: &str = "https://shopping.yahooapis.jp/ShoppingWebService/V3/itemSearch";

/// Yahoo Shopping item search (V3). The application ID is a mandatory
/// credential: request failures fail the whole aggregation.
pub struct YahooProvider {
    app_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    seller: Option<Seller>,
    #[serde(default)]
    review: Option<Review>,
    #[serde(default)]
    description: Option<String>,
    /// Some listings carry the long text under `explanation` instead.
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Seller {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Review {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    rate: Option<f64>,
}

impl YahooProvider {
    pub fn new(app_id: String, client: reqwest::Client) -> Self {
        Self { app_id, client }
    }
}

#[async_trait]
impl SearchProvider for YahooProvider {
    fn platform(&self) -> Platform {
        Platform::YahooShopping
    }

    async fn search(&self, keyword: &str, limit: u32) -> Result<Vec<ProductListing>> {
        let resp = self
            .client
            .get(ITEM_API)
            .query(&[
                ("appid", self.app_id.as_str()),
                ("query", keyword),
                ("results", &limit.to_string()),
                ("sort", "-score"),
            ])
            .send()
            .await
            .context("Yahoo search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Yahoo search returned {status}: {}",
                body.chars().take(200).collect::<String>()
            );
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .context("Yahoo search response was not valid JSON")?;

        let listings = parsed
            .hits
            .into_iter()
            .enumerate()
            .map(|(idx, hit)| ProductListing {
                platform: Platform::YahooShopping,
                rank: idx as u32 + 1,
                collected_at: Utc::now(),
                name: hit.name,
                price: hit.price,
                url: hit.url,
                shop_name: hit.seller.map(|s| s.name).unwrap_or_default(),
                review_count: hit.review.as_ref().and_then(|r| r.count),
                review_avg: hit.review.as_ref().and_then(|r| r.rate),
                description: hit.description.or(hit.explanation).unwrap_or_default(),
            })
            .collect();

        Ok(listings)
    }
}
