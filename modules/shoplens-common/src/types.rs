use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Platforms ---

/// Originating search provider of a listing. The variant order is the fixed
/// adapter-declaration order used by the aggregator and the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Rakuten,
    YahooShopping,
    GoogleSearch,
}

impl Platform {
    pub fn all() -> [Platform; 3] {
        [
            Platform::Rakuten,
            Platform::YahooShopping,
            Platform::GoogleSearch,
        ]
    }

    /// Stable string form stored in record cells.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Rakuten => "rakuten",
            Platform::YahooShopping => "yahoo_shopping",
            Platform::GoogleSearch => "google_search",
        }
    }

    /// Parse a stored cell value back into a platform. Unknown strings are
    /// not an error; they simply make the row ineligible downstream.
    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "rakuten" => Some(Platform::Rakuten),
            "yahoo_shopping" => Some(Platform::YahooShopping),
            "google_search" => Some(Platform::GoogleSearch),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Listings ---

/// One aggregated search result. Created once per aggregation run and never
/// mutated afterwards; later stages only add sibling columns in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListing {
    pub platform: Platform,
    /// 1-based position within this platform's result list for the batch.
    pub rank: u32,
    pub collected_at: DateTime<Utc>,
    pub name: String,
    pub price: Option<f64>,
    pub url: String,
    pub shop_name: String,
    pub review_count: Option<u64>,
    pub review_avg: Option<f64>,
    pub description: String,
}

/// A URL is eligible for capture/enrichment only if it is an absolute
/// http(s) URL.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// --- Detail records ---

/// Max review excerpts carried on a detail record.
pub const MAX_REVIEW_EXCERPTS: usize = 3;
/// Character budget per review excerpt.
pub const REVIEW_EXCERPT_CHARS: usize = 120;
/// Cap on the image list of a detail record.
pub const MAX_IMAGES: usize = 12;

/// Deep product details for one listing URL, produced by the enrichment
/// engine. Any subset of the fields may be populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailRecord {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub seller: Option<String>,
    pub category: Option<String>,
    pub availability: Option<bool>,

    pub price: Option<f64>,
    pub currency: Option<String>,
    pub old_price: Option<f64>,
    /// Defined only when both prices are present and `old_price > price`.
    pub discount_pct: Option<i64>,

    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub review_excerpts: Vec<String>,

    pub main_image: Option<String>,
    pub images: Vec<String>,
    pub variant_count: Option<usize>,

    pub fetched_at: DateTime<Utc>,
}

/// Discount percentage rule: `round((1 - price/old_price) * 100)`, defined
/// only when `old_price > price`.
pub fn discount_pct(price: Option<f64>, old_price: Option<f64>) -> Option<i64> {
    match (price, old_price) {
        (Some(p), Some(o)) if o > p && o > 0.0 => Some(((1.0 - p / o) * 100.0).round() as i64),
        _ => None,
    }
}

/// Truncate a string to at most `max` characters, respecting char
/// boundaries.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Render a numeric cell the way a sheet would: no trailing `.0` on whole
/// numbers.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_pct_basic() {
        assert_eq!(discount_pct(Some(800.0), Some(1000.0)), Some(20));
    }

    #[test]
    fn discount_pct_absent_when_old_price_not_higher() {
        assert_eq!(discount_pct(Some(1000.0), Some(1000.0)), None);
        assert_eq!(discount_pct(Some(1200.0), Some(1000.0)), None);
        assert_eq!(discount_pct(None, Some(1000.0)), None);
        assert_eq!(discount_pct(Some(800.0), None), None);
    }

    #[test]
    fn discount_pct_rounds() {
        // 1 - 2/3 = 33.33..%
        assert_eq!(discount_pct(Some(2.0), Some(3.0)), Some(33));
        // 1 - 1/3 = 66.66..%
        assert_eq!(discount_pct(Some(1.0), Some(3.0)), Some(67));
    }

    #[test]
    fn platform_round_trips_through_cell_string() {
        for p in Platform::all() {
            assert_eq!(Platform::parse(p.as_str()), Some(p));
        }
        assert_eq!(Platform::parse("amazon"), None);
    }

    #[test]
    fn http_url_check() {
        assert!(is_http_url("https://example.com/item?x=1"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url(""));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
        assert_eq!(truncate_chars("日本語のレビュー", 3), "日本語");
        assert_eq!(truncate_chars("ok", 10), "ok");
    }
}
