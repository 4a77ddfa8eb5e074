use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use shoplens_common::{Platform, ProductListing};

use super::SearchProvider;

const SEARCH_API: &str = "https://www.googleapis.com/customsearch/v1";

/// The Custom Search API caps one page at 10 results.
const MAX_RESULTS: u32 = 10;

/// Google Custom Search. Credentials are optional: when either one is
/// missing, or the request itself fails, the adapter degrades to zero
/// results with a warning instead of failing the aggregation.
pub struct GoogleProvider {
    api_key: Option<String>,
    search_engine_id: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}

impl GoogleProvider {
    pub fn new(
        api_key: Option<String>,
        search_engine_id: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            api_key,
            search_engine_id,
            client,
        }
    }

    async fn request(&self, key: &str, cx: &str, keyword: &str, limit: u32) -> Result<Vec<Item>> {
        let resp = self
            .client
            .get(SEARCH_API)
            .query(&[
                ("key", key),
                ("cx", cx),
                ("q", keyword),
                ("num", &limit.min(MAX_RESULTS).to_string()),
                ("lr", "lang_ja"),
                ("safe", "medium"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Google search returned {status}: {}",
                body.chars().take(200).collect::<String>()
            );
        }

        let parsed: SearchResponse = resp.json().await?;
        Ok(parsed.items)
    }
}

#[async_trait]
impl SearchProvider for GoogleProvider {
    fn platform(&self) -> Platform {
        Platform::GoogleSearch
    }

    async fn search(&self, keyword: &str, limit: u32) -> Result<Vec<ProductListing>> {
        let (key, cx) = match (&self.api_key, &self.search_engine_id) {
            (Some(key), Some(cx)) => (key.clone(), cx.clone()),
            _ => {
                warn!("Google Custom Search credentials not configured, returning no results");
                return Ok(Vec::new());
            }
        };

        let items = match self.request(&key, &cx, keyword, limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Google search failed, returning no results");
                return Ok(Vec::new());
            }
        };

        let listings = items
            .into_iter()
            .enumerate()
            .map(|(idx, it)| ProductListing {
                platform: Platform::GoogleSearch,
                rank: idx as u32 + 1,
                collected_at: Utc::now(),
                name: it.title,
                shop_name: extract_domain(&it.link),
                url: it.link,
                // A web search result carries no structured price or reviews.
                price: None,
                review_count: None,
                review_avg: None,
                description: it.snippet.unwrap_or_default(),
            })
            .collect();

        Ok(listings)
    }
}

/// Hostname of a result link with the `www.` prefix stripped; the raw input
/// when it does not parse as a URL.
fn extract_domain(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credentials_degrade_to_empty() {
        let provider = GoogleProvider::new(None, None, reqwest::Client::new());
        let out = provider.search("headphones", 10).await.unwrap();
        assert!(out.is_empty());

        let provider = GoogleProvider::new(
            Some("key".to_string()),
            None,
            reqwest::Client::new(),
        );
        let out = provider.search("headphones", 10).await.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn extracts_registrable_domain() {
        assert_eq!(
            extract_domain("https://www.example.co.jp/item/42?ref=track"),
            "example.co.jp"
        );
        assert_eq!(extract_domain("not a url"), "not a url");
    }
}
