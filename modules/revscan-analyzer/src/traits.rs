// Trait seams for the analysis pipeline.
//
// ReviewSource: one provider query per (domain, product id).
// ReviewClassifier: one review text in, one Prediction out.
// ResultSink: best-effort persistence of the per-review table.
//
// Mocks for all three live in `testing`.

use anyhow::Result;
use async_trait::async_trait;

use revscan_common::{Prediction, ReviewVerdict};
use serpapi_client::{ReviewSection, SerpApiClient};

// ---------------------------------------------------------------------------
// ReviewSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch every review-bearing section for a product on one domain.
    async fn fetch_sections(&self, domain: &str, product_id: &str) -> Result<Vec<ReviewSection>>;
}

#[async_trait]
impl ReviewSource for SerpApiClient {
    async fn fetch_sections(&self, domain: &str, product_id: &str) -> Result<Vec<ReviewSection>> {
        Ok(self.product_reviews(domain, product_id).await?)
    }
}

// ---------------------------------------------------------------------------
// ReviewClassifier
// ---------------------------------------------------------------------------

/// Synchronous, CPU-bound classification of a single text. Implementations
/// must be read-only after construction.
pub trait ReviewClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction>;
}

// ---------------------------------------------------------------------------
// ResultSink
// ---------------------------------------------------------------------------

pub trait ResultSink: Send + Sync {
    fn write(&self, rows: &[ReviewVerdict]) -> Result<()>;
}
