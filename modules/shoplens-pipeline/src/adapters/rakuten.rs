use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use shoplens_common::{Platform, ProductListing};

use super::SearchProvider;

const SEARCH_API: &str = "https://app.rakuten.co.jp/services/api/IchibaItem/Search/20220601";

/// Response element list, bounded to the fields we map.
const ELEMENTS: &str =
    "itemName,itemPrice,itemUrl,shopName,reviewCount,reviewAverage,itemCaption";

/// Rakuten Ichiba item search. The application ID is a mandatory
/// credential: request failures fail the whole aggregation.
pub struct RakutenProvider {
    app_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Items", default)]
    items: Vec<Item>,
}

// formatVersion=2 returns items as a flat array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    #[serde(default)]
    item_name: String,
    #[serde(default)]
    item_price: Option<f64>,
    #[serde(default)]
    item_url: String,
    #[serde(default)]
    shop_name: String,
    #[serde(default)]
    review_count: Option<u64>,
    #[serde(default)]
    review_average: Option<f64>,
    #[serde(default)]
    item_caption: Option<String>,
}

impl RakutenProvider {
    pub fn new(app_id: String, client: reqwest::Client) -> Self {
        Self { app_id, client }
    }
}

#[async_trait]
impl SearchProvider for RakutenProvider {
    fn platform(&self) -> Platform {
        Platform::Rakuten
    }

    async fn search(&self, keyword: &str, limit: u32) -> Result<Vec<ProductListing>> {
        let resp = self
            .client
            .get(SEARCH_API)
            .query(&[
                ("applicationId", self.app_id.as_str()),
                ("keyword", keyword),
                ("hits", &limit.to_string()),
                ("sort", "standard"),
                ("formatVersion", "2"),
                ("elements", ELEMENTS),
            ])
            .send()
            .await
            .context("Rakuten search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Rakuten search returned {status}: {}",
                body.chars().take(200).collect::<String>()
            );
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .context("Rakuten search response was not valid JSON")?;

        let listings = parsed
            .items
            .into_iter()
            .enumerate()
            .map(|(idx, it)| ProductListing {
                platform: Platform::Rakuten,
                rank: idx as u32 + 1,
                collected_at: Utc::now(),
                name: it.item_name,
                price: it.item_price,
                url: it.item_url,
                shop_name: it.shop_name,
                review_count: it.review_count,
                review_avg: it.review_average,
                description: it.item_caption.unwrap_or_default(),
            })
            .collect();

        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_missing_optional_fields() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"Items":[{"itemName":"A","itemUrl":"https://item.rakuten.co.jp/a"},{}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].item_name, "A");
        assert!(parsed.items[1].item_price.is_none());
        assert_eq!(parsed.items[1].item_url, "");
    }

    #[test]
    fn tolerates_empty_item_list() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"Items":[]}"#).unwrap();
        assert!(parsed.items.is_empty());
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_empty());
    }
}
