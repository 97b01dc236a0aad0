pub mod error;
pub mod types;

use std::time::Duration;

pub use error::{Result, SerpApiError};
pub use types::{
    AttributedReview, Insight, InsightExample, NativeReview, ProductResponse, ReviewSection,
    ReviewSummary, ReviewsInformation,
};

const BASE_URL: &str = "https://serpapi.com";

/// SerpApi engine returning a single Amazon product page with its reviews.
const AMAZON_PRODUCT_ENGINE: &str = "amazon_product";

pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (local stand-ins, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch the product page for `asin` on the given Amazon domain
    /// (e.g. `amazon.co.uk`).
    pub async fn amazon_product(&self, amazon_domain: &str, asin: &str) -> Result<ProductResponse> {
        tracing::debug!(amazon_domain, asin, "SerpApi amazon_product request");

        let url = format!("{}/search.json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("engine", AMAZON_PRODUCT_ENGINE),
                ("amazon_domain", amazon_domain),
                ("asin", asin),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SerpApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let product = parse_product_response(&body)?;
        tracing::debug!(
            amazon_domain,
            asin,
            native_reviews = product.reviews.len(),
            "SerpApi amazon_product response"
        );
        Ok(product)
    }

    /// Fetch a product and flatten it into review sections.
    pub async fn product_reviews(
        &self,
        amazon_domain: &str,
        asin: &str,
    ) -> Result<Vec<ReviewSection>> {
        let product = self.amazon_product(amazon_domain, asin).await?;
        let sections = product.sections();
        tracing::info!(amazon_domain, asin, count = sections.len(), "Fetched review sections");
        Ok(sections)
    }
}

/// Decode a response body, surfacing SerpApi's in-band `error` field.
pub fn parse_product_response(body: &str) -> Result<ProductResponse> {
    let product: ProductResponse = serde_json::from_str(body)?;
    if let Some(message) = product.error.clone() {
        return Err(SerpApiError::Search(message));
    }
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_band_error_becomes_search_error() {
        let err = parse_product_response(r#"{"error": "Invalid API key."}"#).unwrap_err();
        assert!(matches!(err, SerpApiError::Search(ref m) if m == "Invalid API key."));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_product_response("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, SerpApiError::Parse(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SerpApiClient::new("key".into(), Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let client = SerpApiClient::new("key".into(), Duration::from_millis(500))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = client.amazon_product("amazon.com", "B08N5WRWNW").await.unwrap_err();
        assert!(matches!(err, SerpApiError::Network(_)));
    }
}
