pub mod error;
pub mod types;

pub use error::{DiffbotError, Result};
pub use types::{Availability, AggregateRating, ProductObject, ProductResponse};

const PRODUCT_ENDPOINT: &str = "https://api.diffbot.com/v3/product";

/// Restricted field list sent on every request to bound response size and
/// per-call cost.
const FIELDS: &str = "title,price,offerPrice,offerPriceDetails,regularPrice,priceCurrency,\
availability,brand,sku,seller,images,variants,category,breadcrumb,aggregateRating,reviews";

pub struct DiffbotClient {
    client: reqwest::Client,
    token: String,
}

impl DiffbotClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    /// Extract product details for one URL. Returns the first (only)
    /// product object of the response envelope.
    pub async fn product(&self, url: &str) -> Result<ProductObject> {
        let resp = self
            .client
            .get(PRODUCT_ENDPOINT)
            .query(&[
                ("token", self.token.as_str()),
                ("url", url),
                ("fields", FIELDS),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiffbotError::RateLimited(
                body.chars().take(200).collect(),
            ));
        }
        if status.as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiffbotError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        let envelope: ProductResponse = serde_json::from_str(&resp.text().await?)?;
        tracing::debug!(url, objects = envelope.objects.len(), "Product response parsed");
        envelope
            .objects
            .into_iter()
            .next()
            .ok_or(DiffbotError::NoObject)
    }
}
