// Test doubles for the analysis pipeline.
//
// - MockReviewSource (ReviewSource): HashMap-based domain→sections, records calls
// - ScriptedClassifier (ReviewClassifier): text→fixed prediction
// - StubEncoder / FixedModel (TextEncoder / SequenceModel): for InferenceContext
// - MemorySink / FailingSink (ResultSink)
//
// Plus builders for review sections and product refs.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use revscan_common::{Prediction, ProductRef, ReviewVerdict, Verdict};
use serpapi_client::{AttributedReview, InsightExample, NativeReview, ReviewSection};

use crate::classifier::{
    frame_sequence, EncodedText, SequenceModel, SpecialTokens, TextEncoder, MAX_SEQUENCE_LENGTH,
};
use crate::traits::{ResultSink, ReviewClassifier, ReviewSource};

// ---------------------------------------------------------------------------
// MockReviewSource
// ---------------------------------------------------------------------------

/// Returns registered sections per domain and `Err` for every other domain.
/// Builder pattern: `.on_domain()`, `.failing()`.
pub struct MockReviewSource {
    domains: HashMap<String, Vec<ReviewSection>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockReviewSource {
    pub fn new() -> Self {
        Self {
            domains: HashMap::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_domain(mut self, domain: &str, sections: Vec<ReviewSection>) -> Self {
        self.domains.insert(domain.to_string(), sections);
        self
    }

    pub fn failing(mut self, domain: &str) -> Self {
        self.failing.insert(domain.to_string());
        self
    }

    /// Every `(domain, product_id)` queried so far, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockReviewSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewSource for MockReviewSource {
    async fn fetch_sections(&self, domain: &str, product_id: &str) -> Result<Vec<ReviewSection>> {
        self.calls
            .lock()
            .unwrap()
            .push((domain.to_string(), product_id.to_string()));

        if self.failing.contains(domain) {
            bail!("MockReviewSource: {domain} is down");
        }
        self.domains
            .get(domain)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockReviewSource: no sections registered for {domain}"))
    }
}

// ---------------------------------------------------------------------------
// ScriptedClassifier
// ---------------------------------------------------------------------------

/// Returns a fixed prediction per text; unknown texts are classified with
/// the fallback, or fail when none is set.
pub struct ScriptedClassifier {
    scripted: HashMap<String, Prediction>,
    fallback: Option<Prediction>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            scripted: HashMap::new(),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, text: &str, verdict: Verdict, confidence: f64) -> Self {
        self.scripted.insert(
            text.to_string(),
            Prediction {
                verdict,
                confidence,
            },
        );
        self
    }

    pub fn otherwise(mut self, verdict: Verdict, confidence: f64) -> Self {
        self.fallback = Some(Prediction {
            verdict,
            confidence,
        });
        self
    }

    /// Texts classified so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for ScriptedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewClassifier for ScriptedClassifier {
    fn classify(&self, text: &str) -> Result<Prediction> {
        self.calls.lock().unwrap().push(text.to_string());
        match self.scripted.get(text).copied().or(self.fallback) {
            Some(prediction) => Ok(prediction),
            None => bail!("ScriptedClassifier: no prediction for {text:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// StubEncoder / FixedModel
// ---------------------------------------------------------------------------

/// Maps each whitespace-separated word to its byte length + 1000, then frames
/// the sequence like the real encoder.
pub struct StubEncoder {
    specials: SpecialTokens,
}

impl StubEncoder {
    pub fn new(specials: SpecialTokens) -> Self {
        Self { specials }
    }
}

impl TextEncoder for StubEncoder {
    fn encode(&self, text: &str) -> Result<EncodedText> {
        let content: Vec<u32> = text.split_whitespace().map(|w| 1000 + w.len() as u32).collect();
        Ok(frame_sequence(&content, &self.specials, MAX_SEQUENCE_LENGTH))
    }
}

/// Returns the same logits for every input.
pub struct FixedModel {
    logits: Vec<f32>,
}

impl FixedModel {
    pub fn new(logits: Vec<f32>) -> Self {
        Self { logits }
    }
}

impl SequenceModel for FixedModel {
    fn logits(&self, _encoded: &EncodedText) -> Result<Vec<f32>> {
        Ok(self.logits.clone())
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Keeps every written table in memory.
#[derive(Default)]
pub struct MemorySink {
    writes: Mutex<Vec<Vec<ReviewVerdict>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<Vec<ReviewVerdict>> {
        self.writes.lock().unwrap().clone()
    }
}

impl ResultSink for MemorySink {
    fn write(&self, rows: &[ReviewVerdict]) -> Result<()> {
        self.writes.lock().unwrap().push(rows.to_vec());
        Ok(())
    }
}

/// Fails every write.
pub struct FailingSink;

impl ResultSink for FailingSink {
    fn write(&self, _rows: &[ReviewVerdict]) -> Result<()> {
        bail!("FailingSink: disk full")
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn product(domain: &str) -> ProductRef {
    ProductRef::new(domain, "B08N5WRWNW")
}

fn attributed(text: &str) -> AttributedReview {
    AttributedReview {
        text: Some(text.to_string()),
        ..Default::default()
    }
}

pub fn author_review(text: &str) -> ReviewSection {
    ReviewSection::AuthorReview(attributed(text))
}

pub fn other_country_review(text: &str) -> ReviewSection {
    ReviewSection::OtherCountryReview(attributed(text))
}

pub fn top_review(text: &str) -> ReviewSection {
    ReviewSection::TopReview(attributed(text))
}

pub fn textless_review() -> ReviewSection {
    ReviewSection::TopReview(AttributedReview::default())
}

pub fn insight_example(snippet: &str) -> ReviewSection {
    ReviewSection::InsightExample(InsightExample {
        snippet: Some(snippet.to_string()),
        link: None,
    })
}

pub fn native_review(content: &str) -> ReviewSection {
    ReviewSection::NativeReview(NativeReview {
        content: Some(Some(content.to_string())),
        ..Default::default()
    })
}

pub fn native_body_review(body: &str) -> ReviewSection {
    ReviewSection::NativeReview(NativeReview {
        body: Some(body.to_string()),
        ..Default::default()
    })
}

/// `count` distinct top reviews: "<prefix> review 0", "<prefix> review 1", ...
pub fn numbered_reviews(prefix: &str, count: usize) -> Vec<ReviewSection> {
    (0..count)
        .map(|i| top_review(&format!("{prefix} review {i}")))
        .collect()
}
