//! On-disk DistilBERT classifier artifacts, loaded with candle.
//!
//! Expects a Hugging Face export directory holding `tokenizer.json`,
//! `config.json` and `model.safetensors`.

mod distilbert;
mod tokenizer;

pub use distilbert::DistilBertSequenceModel;
pub use tokenizer::TokenizerEncoder;

use std::path::Path;

use anyhow::Result;
use tracing::info;

use revscan_common::RevscanError;

use crate::classifier::{InferenceContext, LabelDecoder};

impl InferenceContext {
    /// Load tokenizer, weights and label decoder once at process start.
    pub fn load(model_dir: &Path, labels_path: Option<&Path>) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(RevscanError::Config(format!(
                "MODEL_DIR {} is not a directory",
                model_dir.display()
            ))
            .into());
        }
        let decoder = match labels_path {
            Some(path) => LabelDecoder::from_file(path)?,
            None => LabelDecoder::default_labels(),
        };
        let encoder = TokenizerEncoder::from_dir(model_dir)?;
        let model = DistilBertSequenceModel::load(model_dir, decoder.classes().len())?;

        info!(
            model_dir = %model_dir.display(),
            classes = ?decoder.classes(),
            "Classifier loaded"
        );
        Ok(Self::new(Box::new(encoder), Box::new(model), decoder))
    }
}
