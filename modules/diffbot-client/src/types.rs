use serde::Deserialize;

/// Envelope returned by the Product API. Zero or one product object.
#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub objects: Vec<ProductObject>,
}

/// One extracted product. Every field is optional; pages vary wildly in
/// what Diffbot can recover from them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductObject {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub availability: Option<Availability>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub breadcrumb: Vec<Breadcrumb>,

    #[serde(default)]
    pub price: Option<PriceValue>,
    #[serde(default)]
    pub offer_price: Option<PriceValue>,
    #[serde(default)]
    pub offer_price_details: Option<PriceDetails>,
    #[serde(default)]
    pub regular_price: Option<PriceValue>,
    #[serde(default)]
    pub regular_price_details: Option<PriceDetails>,
    #[serde(default)]
    pub price_currency: Option<String>,

    #[serde(default)]
    pub aggregate_rating: Option<AggregateRating>,
    #[serde(default)]
    pub reviews: Vec<Review>,

    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub variants: Vec<serde_json::Value>,
}

/// Prices arrive either as bare numbers or as display strings
/// (`"1,980"`, `"¥1980"`, `"$24.99"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PriceValue::Number(n) => Some(*n),
            PriceValue::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                cleaned.parse().ok()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDetails {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Availability arrives as a boolean or as free text ("In Stock").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    Flag(bool),
    Text(String),
}

impl Availability {
    pub fn in_stock(&self) -> bool {
        match self {
            Availability::Flag(b) => *b,
            Availability::Text(s) => !s.to_lowercase().contains("out of stock"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Breadcrumb {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRating {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: Option<String>,
}

impl ProductObject {
    /// Best available sale price: `offerPriceDetails.amount` wins, then the
    /// looser string/number fields.
    pub fn best_price(&self) -> Option<f64> {
        self.offer_price_details
            .as_ref()
            .and_then(|d| d.amount)
            .or_else(|| self.offer_price.as_ref().and_then(|p| p.as_f64()))
            .or_else(|| self.price.as_ref().and_then(|p| p.as_f64()))
    }

    /// Pre-discount price when the page advertises one.
    pub fn regular_price_value(&self) -> Option<f64> {
        self.regular_price_details
            .as_ref()
            .and_then(|d| d.amount)
            .or_else(|| self.regular_price.as_ref().and_then(|p| p.as_f64()))
    }

    /// Category string, falling back to the breadcrumb trail.
    pub fn category_path(&self) -> Option<String> {
        if let Some(c) = &self.category {
            if !c.is_empty() {
                return Some(c.clone());
            }
        }
        let trail: Vec<&str> = self
            .breadcrumb
            .iter()
            .filter_map(|b| b.name.as_deref())
            .collect();
        if trail.is_empty() {
            None
        } else {
            Some(trail.join(" > "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_value_parses_display_strings() {
        let v: PriceValue = serde_json::from_str(r#""¥1,980""#).unwrap();
        assert_eq!(v.as_f64(), Some(1980.0));
        let v: PriceValue = serde_json::from_str(r#""$24.99""#).unwrap();
        assert_eq!(v.as_f64(), Some(24.99));
        let v: PriceValue = serde_json::from_str("42.5").unwrap();
        assert_eq!(v.as_f64(), Some(42.5));
    }

    #[test]
    fn best_price_prefers_offer_details() {
        let obj: ProductObject = serde_json::from_str(
            r#"{"price":"$30.00","offerPrice":"$25.00","offerPriceDetails":{"amount":24.99}}"#,
        )
        .unwrap();
        assert_eq!(obj.best_price(), Some(24.99));
    }

    #[test]
    fn category_falls_back_to_breadcrumb() {
        let obj: ProductObject = serde_json::from_str(
            r#"{"breadcrumb":[{"name":"Electronics"},{"name":"Audio"}]}"#,
        )
        .unwrap();
        assert_eq!(obj.category_path().as_deref(), Some("Electronics > Audio"));
    }

    #[test]
    fn empty_object_deserializes() {
        let obj: ProductObject = serde_json::from_str("{}").unwrap();
        assert!(obj.title.is_none());
        assert!(obj.best_price().is_none());
        assert!(obj.images.is_empty());
    }

    #[test]
    fn availability_text_and_flag() {
        let a: Availability = serde_json::from_str("true").unwrap();
        assert!(a.in_stock());
        let a: Availability = serde_json::from_str(r#""Out of Stock""#).unwrap();
        assert!(!a.in_stock());
        let a: Availability = serde_json::from_str(r#""In Stock""#).unwrap();
        assert!(a.in_stock());
    }
}
