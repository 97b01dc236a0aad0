//! End-to-end analysis of one product: normalize, collect, classify each
//! review in order, summarise.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use revscan_common::{
    AnalysisReport, AnalysisSummary, Prediction, ReviewVerdict, RevscanError, Verdict,
};

use crate::collector::ReviewCollector;
use crate::normalizer::normalize;
use crate::traits::{ResultSink, ReviewClassifier, ReviewSource};

pub struct Analyzer {
    collector: ReviewCollector,
    classifier: Arc<dyn ReviewClassifier>,
    sink: Arc<dyn ResultSink>,
}

impl Analyzer {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        classifier: Arc<dyn ReviewClassifier>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            collector: ReviewCollector::new(source),
            classifier,
            sink,
        }
    }

    /// Override how many reviews the collector aims for before it stops
    /// querying further domains.
    pub fn with_review_target(mut self, target: usize) -> Self {
        self.collector = self.collector.with_target(target);
        self
    }

    /// Analyze the product named by `identifier`.
    ///
    /// An identifier with no product id fails with
    /// `RevscanError::InvalidIdentifier` before any source is queried.
    /// Classifier failures abort the run. Sink failures are only logged.
    pub async fn analyze(&self, identifier: &str, pages_hint: u32) -> Result<AnalysisReport> {
        let product = normalize(identifier)?;
        info!(product = %product, pages_hint, "Starting analysis");

        let reviews = self.collector.collect(&product).await;

        let mut tally = Tally::default();
        let mut results = Vec::with_capacity(reviews.len());
        for review in reviews {
            let prediction = self.classify(&review).await?;
            tally.record(&prediction);
            results.push(ReviewVerdict {
                review,
                prediction: prediction.verdict,
                confidence: round2(prediction.confidence),
            });
        }

        let summary = tally.summary();
        info!(
            product = %product,
            total_reviews = summary.total_reviews,
            fake_percent = summary.fake_percent,
            avg_confidence = summary.avg_confidence,
            "Analysis complete"
        );

        if let Err(e) = self.sink.write(&results) {
            let e = RevscanError::Persistence(format!("{e:#}"));
            warn!(error = %e, "Results not saved");
        }

        Ok(AnalysisReport {
            product,
            summary,
            results,
        })
    }

    /// Run one blocking inference off the async executor.
    async fn classify(&self, review: &str) -> Result<Prediction> {
        let classifier = Arc::clone(&self.classifier);
        let text = review.to_string();
        tokio::task::spawn_blocking(move || classifier.classify(&text))
            .await
            .context("classification task panicked")?
    }
}

/// Running totals over classified reviews.
#[derive(Debug, Default)]
struct Tally {
    total: usize,
    fake: usize,
    confidence_sum: f64,
}

impl Tally {
    fn record(&mut self, prediction: &Prediction) {
        self.total += 1;
        if prediction.verdict == Verdict::Fake {
            self.fake += 1;
        }
        self.confidence_sum += prediction.confidence;
    }

    fn summary(&self) -> AnalysisSummary {
        if self.total == 0 {
            return AnalysisSummary::default();
        }
        let total = self.total as f64;
        let fake_percent = round2(100.0 * self.fake as f64 / total);
        AnalysisSummary {
            total_reviews: self.total,
            fake_percent,
            genuine_percent: round2(100.0 - fake_percent),
            avg_confidence: round2(self.confidence_sum / total),
        }
    }
}

/// Round to 2 decimal places, exact halves to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(verdict: Verdict, confidence: f64) -> Prediction {
        Prediction {
            verdict,
            confidence,
        }
    }

    #[test]
    fn empty_tally_is_all_zero() {
        assert_eq!(Tally::default().summary(), AnalysisSummary::default());
    }

    #[test]
    fn percentages_always_sum_to_exactly_100() {
        for total in 1..=100 {
            for fake in 0..=total {
                let mut tally = Tally::default();
                for i in 0..total {
                    let verdict = if i < fake { Verdict::Fake } else { Verdict::Genuine };
                    tally.record(&prediction(verdict, 50.0));
                }
                let summary = tally.summary();
                assert_eq!(
                    summary.fake_percent + summary.genuine_percent,
                    100.0,
                    "{fake}/{total}"
                );
            }
        }
    }

    #[test]
    fn exact_half_percentages_round_to_even() {
        let mut tally = Tally::default();
        tally.record(&prediction(Verdict::Fake, 50.0));
        for _ in 0..31 {
            tally.record(&prediction(Verdict::Genuine, 50.0));
        }
        let summary = tally.summary();
        assert_eq!((summary.fake_percent, summary.genuine_percent), (3.12, 96.88));
    }

    #[test]
    fn average_uses_unrounded_confidences() {
        let mut tally = Tally::default();
        tally.record(&prediction(Verdict::Genuine, 50.004));
        tally.record(&prediction(Verdict::Genuine, 50.004));
        tally.record(&prediction(Verdict::Genuine, 50.004));
        assert_eq!(tally.summary().avg_confidence, 50.0);
        assert_eq!(tally.summary().fake_percent, 0.0);
        assert_eq!(tally.summary().genuine_percent, 100.0);
    }

    #[test]
    fn round2_behaviour() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(76.233_333), 76.23);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(3.125), 3.12);
        assert_eq!(round2(96.875), 96.88);
    }
}
