//! Multi-domain review collection.
//!
//! Queries the product's own marketplace first, then a fixed list of other
//! English-language regions, until enough distinct review texts are held.
//! A failing domain is skipped; it never aborts the run.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use revscan_common::{ProductRef, RevscanError};

use crate::traits::ReviewSource;

/// Hard upper bound on the number of reviews returned by one collection.
pub const REVIEW_CAP: usize = 100;

/// Default number of reviews after which no further domains are queried.
pub const DEFAULT_REVIEW_TARGET: usize = 55;

/// Regional marketplaces tried after the product's own domain.
pub const FALLBACK_DOMAINS: [&str; 4] = ["amazon.co.uk", "amazon.ca", "amazon.in", "amazon.com.au"];

pub struct ReviewCollector {
    source: Arc<dyn ReviewSource>,
    target: usize,
}

impl ReviewCollector {
    pub fn new(source: Arc<dyn ReviewSource>) -> Self {
        Self {
            source,
            target: DEFAULT_REVIEW_TARGET,
        }
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    /// Collect distinct, non-empty review texts in discovery order.
    ///
    /// The result never holds two equal strings and never exceeds
    /// [`REVIEW_CAP`]. It may be shorter than the target, or empty, when
    /// sources are exhausted or failing.
    pub async fn collect(&self, product: &ProductRef) -> Vec<String> {
        let mut reviews = ReviewSet::default();

        for domain in candidate_domains(&product.domain) {
            if reviews.len() >= self.target {
                break;
            }

            let sections = match self.source.fetch_sections(&domain, &product.id).await {
                Ok(sections) => sections,
                Err(e) => {
                    let e = RevscanError::SourceUnavailable {
                        domain: domain.clone(),
                        message: e.to_string(),
                    };
                    warn!(product_id = product.id.as_str(), error = %e, "Skipping domain");
                    continue;
                }
            };

            let before = reviews.len();
            for section in &sections {
                if let Some(text) = section.text() {
                    reviews.insert(text);
                }
            }
            debug!(
                domain = domain.as_str(),
                sections = sections.len(),
                added = reviews.len() - before,
                "Merged review sections"
            );
        }

        let mut collected = reviews.into_vec();
        collected.truncate(REVIEW_CAP);
        info!(product = %product, count = collected.len(), "Review collection complete");
        collected
    }
}

/// The product's own domain followed by every fallback region not equal to it.
pub fn candidate_domains(primary: &str) -> Vec<String> {
    std::iter::once(primary)
        .chain(FALLBACK_DOMAINS.into_iter().filter(|d| *d != primary))
        .map(str::to_string)
        .collect()
}

/// Insertion-ordered set of review texts, compared by exact string equality.
#[derive(Default)]
struct ReviewSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl ReviewSet {
    fn insert(&mut self, text: &str) -> bool {
        if text.is_empty() || self.seen.contains(text) {
            return false;
        }
        self.seen.insert(text.to_string());
        self.ordered.push(text.to_string());
        true
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn candidates_start_with_primary() {
        assert_eq!(
            candidate_domains("amazon.com"),
            vec!["amazon.com", "amazon.co.uk", "amazon.ca", "amazon.in", "amazon.com.au"]
        );
    }

    #[test]
    fn candidates_skip_repeat_of_primary() {
        assert_eq!(
            candidate_domains("amazon.ca"),
            vec!["amazon.ca", "amazon.co.uk", "amazon.in", "amazon.com.au"]
        );
    }

    #[test]
    fn review_set_dedups_exactly() {
        let mut set = ReviewSet::default();
        assert!(set.insert("Great"));
        assert!(!set.insert("Great"));
        assert!(set.insert("great"));
        assert!(set.insert("Great "));
        assert!(!set.insert(""));
        assert_eq!(set.into_vec(), vec!["Great", "great", "Great "]);
    }

    #[tokio::test]
    async fn merges_sections_in_order_and_dedups_across_domains() {
        let source = MockReviewSource::new()
            .on_domain(
                "amazon.com",
                vec![
                    author_review("a"),
                    top_review("b"),
                    insight_example("c"),
                    native_review("a"),
                ],
            )
            .on_domain("amazon.co.uk", vec![other_country_review("b"), native_body_review("d")]);
        let collector = ReviewCollector::new(Arc::new(source));

        let reviews = collector.collect(&product("amazon.com")).await;
        assert_eq!(reviews, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn failing_domain_is_skipped() {
        let source = Arc::new(
            MockReviewSource::new()
                .failing("amazon.com")
                .on_domain("amazon.co.uk", vec![top_review("survivor")]),
        );
        let collector = ReviewCollector::new(source.clone());

        let reviews = collector.collect(&product("amazon.com")).await;
        assert_eq!(reviews, vec!["survivor"]);
        assert_eq!(source.calls().len(), 5);
    }

    #[tokio::test]
    async fn all_domains_failing_yields_empty() {
        let collector = ReviewCollector::new(Arc::new(MockReviewSource::new()));
        assert!(collector.collect(&product("amazon.com")).await.is_empty());
    }

    #[tokio::test]
    async fn stops_querying_once_target_reached() {
        let source = Arc::new(
            MockReviewSource::new()
                .on_domain("amazon.com", numbered_reviews("com", 3))
                .on_domain("amazon.co.uk", numbered_reviews("uk", 3)),
        );
        let collector = ReviewCollector::new(source.clone()).with_target(3);

        let reviews = collector.collect(&product("amazon.com")).await;
        assert_eq!(reviews.len(), 3);
        assert_eq!(source.calls(), vec![("amazon.com".to_string(), "B08N5WRWNW".to_string())]);
    }

    #[tokio::test]
    async fn target_is_checked_between_domains_not_within() {
        let source = MockReviewSource::new()
            .on_domain("amazon.com", numbered_reviews("com", 2))
            .on_domain("amazon.co.uk", numbered_reviews("uk", 5));
        let collector = ReviewCollector::new(Arc::new(source)).with_target(3);

        let reviews = collector.collect(&product("amazon.com")).await;
        assert_eq!(reviews.len(), 7);
    }

    #[tokio::test]
    async fn output_is_capped() {
        let source = MockReviewSource::new().on_domain("amazon.com", numbered_reviews("com", 250));
        let collector = ReviewCollector::new(Arc::new(source)).with_target(1000);

        let reviews = collector.collect(&product("amazon.com")).await;
        assert_eq!(reviews.len(), REVIEW_CAP);
        assert_eq!(reviews[0], "com review 0");
        assert_eq!(reviews[99], "com review 99");
    }

    #[tokio::test]
    async fn textless_and_empty_records_are_ignored() {
        let source = MockReviewSource::new().on_domain(
            "amazon.com",
            vec![top_review(""), textless_review(), insight_example("kept")],
        );
        let collector = ReviewCollector::new(Arc::new(source));

        assert_eq!(collector.collect(&product("amazon.com")).await, vec!["kept"]);
    }
}
