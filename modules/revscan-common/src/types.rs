use serde::{Deserialize, Serialize};

/// Marketplace host used when the input names no domain.
pub const PRIMARY_DOMAIN: &str = "amazon.com";

// --- Product identity ---

/// A product on one regional marketplace. Built by the normalizer; the id is
/// always a 10-character uppercase alphanumeric code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef {
    pub domain: String,
    pub id: String,
}

impl ProductRef {
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ProductRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/dp/{}", self.domain, self.id)
    }
}

// --- Classification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Fake,
    Genuine,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Fake => write!(f, "Fake"),
            Verdict::Genuine => write!(f, "Genuine"),
        }
    }
}

/// Classifier output for one text. `confidence` is the probability of the
/// chosen class as a percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub verdict: Verdict,
    pub confidence: f64,
}

/// One row of the per-review results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub review: String,
    pub prediction: Verdict,
    /// Rounded to 2 decimal places.
    pub confidence: f64,
}

/// Aggregate statistics over one analysis run. All zero when no reviews were
/// collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_reviews: usize,
    pub fake_percent: f64,
    pub genuine_percent: f64,
    pub avg_confidence: f64,
}

/// Everything one `analyze` call returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub product: ProductRef,
    pub summary: AnalysisSummary,
    pub results: Vec<ReviewVerdict>,
}

impl AnalysisReport {
    pub fn chart_data(&self) -> ChartData {
        let fake = self
            .results
            .iter()
            .filter(|r| r.prediction == Verdict::Fake)
            .count();
        ChartData {
            fake,
            genuine: self.results.len() - fake,
        }
    }

    /// The results table as parallel arrays, confidences rounded to one
    /// decimal place for display.
    pub fn columns(&self) -> ResultColumns {
        let mut columns = ResultColumns::default();
        for row in &self.results {
            columns.review.push(row.review.clone());
            columns.prediction.push(row.prediction);
            columns.confidence.push((row.confidence * 10.0).round() / 10.0);
        }
        columns
    }
}

// --- Presentation shapes ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartData {
    pub fake: usize,
    pub genuine: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultColumns {
    pub review: Vec<String>,
    pub prediction: Vec<Verdict>,
    pub confidence: Vec<f64>,
}
