//! Single-review classification.
//!
//! A review is encoded to a fixed-length token sequence, run through a
//! two-class sequence model, and the winning class is mapped through the
//! label decoder to a [`Verdict`]. The encoder, model and decoder are bundled
//! in an immutable [`InferenceContext`] that is built once and shared.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use revscan_common::{Prediction, RevscanError, Verdict};

use crate::traits::ReviewClassifier;

/// Every encoded review is truncated or padded to exactly this many tokens.
pub const MAX_SEQUENCE_LENGTH: usize = 256;

/// Training label for machine-generated ("computer generated") reviews.
pub const MACHINE_GENERATED_LABEL: &str = "CG";

/// Labels of the training set the classifier was fit on.
pub const DEFAULT_TRAINING_LABELS: [&str; 2] = ["CG", "OR"];

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub input_ids: Vec<u32>,
    /// 1 for real tokens, 0 for padding.
    pub attention_mask: Vec<u32>,
}

impl EncodedText {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub cls: u32,
    pub sep: u32,
    pub pad: u32,
}

/// Wrap content tokens as `[CLS] content [SEP]`, truncating content from the
/// right so the framed sequence fits `max_len`, then right-pad to `max_len`.
pub fn frame_sequence(content: &[u32], specials: &SpecialTokens, max_len: usize) -> EncodedText {
    let budget = max_len.saturating_sub(2);
    let kept = &content[..content.len().min(budget)];

    let mut input_ids = Vec::with_capacity(max_len);
    input_ids.push(specials.cls);
    input_ids.extend_from_slice(kept);
    input_ids.push(specials.sep);
    input_ids.truncate(max_len);

    let real = input_ids.len();
    let mut attention_mask = vec![1u32; real];
    input_ids.resize(max_len, specials.pad);
    attention_mask.resize(max_len, 0);

    EncodedText {
        input_ids,
        attention_mask,
    }
}

pub trait TextEncoder: Send + Sync {
    /// Encode to exactly [`MAX_SEQUENCE_LENGTH`] tokens.
    fn encode(&self, text: &str) -> Result<EncodedText>;
}

pub trait SequenceModel: Send + Sync {
    /// One forward pass in inference mode; returns one logit per class.
    fn logits(&self, encoded: &EncodedText) -> Result<Vec<f32>>;
}

// ---------------------------------------------------------------------------
// LabelDecoder
// ---------------------------------------------------------------------------

/// Maps class indices back to training labels. Classes are the distinct
/// training labels in ascending order, index = class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDecoder {
    classes: Vec<String>,
}

impl LabelDecoder {
    pub fn fit<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            bail!("label decoder needs at least two distinct labels, got {classes:?}");
        }
        Ok(Self { classes })
    }

    /// Fit over a JSON array of training labels (duplicates allowed).
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels from {}", path.display()))?;
        let labels: Vec<String> = serde_json::from_str(&raw)
            .with_context(|| format!("Labels file {} is not a JSON array of strings", path.display()))?;
        Self::fit(labels)
    }

    pub fn default_labels() -> Self {
        Self {
            classes: DEFAULT_TRAINING_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn verdict(&self, index: usize) -> Option<Verdict> {
        self.decode(index).map(|label| {
            if label == MACHINE_GENERATED_LABEL {
                Verdict::Fake
            } else {
                Verdict::Genuine
            }
        })
    }
}

// ---------------------------------------------------------------------------
// InferenceContext / Classifier
// ---------------------------------------------------------------------------

/// Loaded classifier artifacts. Never mutated after construction, so one
/// instance can serve any number of concurrent requests.
pub struct InferenceContext {
    encoder: Box<dyn TextEncoder>,
    model: Box<dyn SequenceModel>,
    decoder: LabelDecoder,
}

impl InferenceContext {
    pub fn new(
        encoder: Box<dyn TextEncoder>,
        model: Box<dyn SequenceModel>,
        decoder: LabelDecoder,
    ) -> Self {
        Self {
            encoder,
            model,
            decoder,
        }
    }

    pub fn decoder(&self) -> &LabelDecoder {
        &self.decoder
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let encoded = self.encoder.encode(text)?;
        if encoded.len() != MAX_SEQUENCE_LENGTH {
            return Err(RevscanError::Model(format!(
                "encoder produced {} tokens, expected {MAX_SEQUENCE_LENGTH}",
                encoded.len()
            ))
            .into());
        }

        let logits = self.model.logits(&encoded)?;
        if logits.len() != self.decoder.classes().len() {
            return Err(RevscanError::Model(format!(
                "model produced {} logits for {} classes",
                logits.len(),
                self.decoder.classes().len()
            ))
            .into());
        }

        let probs = softmax(&logits);
        let (index, prob) = argmax(&probs)
            .ok_or_else(|| RevscanError::Model("model produced no logits".to_string()))?;
        let verdict = self
            .decoder
            .verdict(index)
            .ok_or_else(|| RevscanError::Model(format!("class index {index} has no label")))?;

        Ok(Prediction {
            verdict,
            confidence: prob * 100.0,
        })
    }
}

/// [`ReviewClassifier`] backed by a shared [`InferenceContext`].
#[derive(Clone)]
pub struct Classifier {
    context: Arc<InferenceContext>,
}

impl Classifier {
    pub fn new(context: Arc<InferenceContext>) -> Self {
        Self { context }
    }
}

impl ReviewClassifier for Classifier {
    fn classify(&self, text: &str) -> Result<Prediction> {
        self.context.predict(text)
    }
}

/// Numerically stable softmax, computed in f64.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .map(|&l| f64::from(l))
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (f64::from(l) - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest probability; the first one wins ties.
fn argmax(probs: &[f64]) -> Option<(usize, f64)> {
    probs.iter().copied().enumerate().fold(None, |best, (i, p)| match best {
        Some((_, bp)) if bp >= p => best,
        _ => Some((i, p)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedModel, StubEncoder};

    const SPECIALS: SpecialTokens = SpecialTokens {
        cls: 101,
        sep: 102,
        pad: 0,
    };

    fn context(logits: Vec<f32>) -> InferenceContext {
        InferenceContext::new(
            Box::new(StubEncoder::new(SPECIALS)),
            Box::new(FixedModel::new(logits)),
            LabelDecoder::default_labels(),
        )
    }

    #[test]
    fn short_content_is_padded() {
        let encoded = frame_sequence(&[7, 8, 9], &SPECIALS, 8);
        assert_eq!(encoded.input_ids, vec![101, 7, 8, 9, 102, 0, 0, 0]);
        assert_eq!(encoded.attention_mask, vec![1, 1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn long_content_is_truncated_keeping_sep() {
        let content: Vec<u32> = (1000..1600).collect();
        let encoded = frame_sequence(&content, &SPECIALS, MAX_SEQUENCE_LENGTH);
        assert_eq!(encoded.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(encoded.input_ids[0], 101);
        assert_eq!(encoded.input_ids[1], 1000);
        assert_eq!(encoded.input_ids[254], 1253);
        assert_eq!(encoded.input_ids[255], 102);
        assert!(encoded.attention_mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn empty_content_is_cls_sep_then_padding() {
        let encoded = frame_sequence(&[], &SPECIALS, MAX_SEQUENCE_LENGTH);
        assert_eq!(&encoded.input_ids[..3], &[101, 102, 0]);
        assert_eq!(encoded.attention_mask.iter().sum::<u32>(), 2);
    }

    #[test]
    fn decoder_sorts_and_dedups_labels() {
        let decoder = LabelDecoder::fit(["OR", "CG", "OR", "CG"]).unwrap();
        assert_eq!(decoder.classes(), &["CG".to_string(), "OR".to_string()]);
        assert_eq!(decoder.verdict(0), Some(Verdict::Fake));
        assert_eq!(decoder.verdict(1), Some(Verdict::Genuine));
        assert_eq!(decoder.verdict(2), None);
        assert_eq!(decoder, LabelDecoder::default_labels());
    }

    #[test]
    fn decoder_rejects_single_label() {
        assert!(LabelDecoder::fit(["CG", "CG"]).is_err());
    }

    #[test]
    fn decoder_reads_labels_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"["OR", "CG", "CG"]"#).unwrap();
        assert_eq!(LabelDecoder::from_file(&path).unwrap(), LabelDecoder::default_labels());
    }

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[2.0, -1.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn machine_generated_class_is_fake() {
        let prediction = context(vec![3.0, 1.0]).predict("Best product ever!!!").unwrap();
        assert_eq!(prediction.verdict, Verdict::Fake);
        let expected = 100.0 / (1.0 + (-2.0f64).exp());
        assert!((prediction.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn other_class_is_genuine() {
        let prediction = context(vec![-0.5, 0.5]).predict("Battery died after a week.").unwrap();
        assert_eq!(prediction.verdict, Verdict::Genuine);
        assert!(prediction.confidence > 50.0 && prediction.confidence <= 100.0);
    }

    #[test]
    fn tie_picks_first_class() {
        let prediction = context(vec![0.0, 0.0]).predict("meh").unwrap();
        assert_eq!(prediction.verdict, Verdict::Fake);
        assert!((prediction.confidence - 50.0).abs() < 1e-9);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = Classifier::new(Arc::new(context(vec![0.3, 1.7])));
        let first = classifier.classify("Works as described").unwrap();
        let second = classifier.classify("Works as described").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wrong_logit_count_is_a_model_error() {
        let err = context(vec![1.0, 2.0, 3.0]).predict("text").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RevscanError>(),
            Some(RevscanError::Model(_))
        ));
    }
}
