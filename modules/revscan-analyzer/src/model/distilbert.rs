use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use serde::Deserialize;

use crate::classifier::{EncodedText, SequenceModel};

/// Fields of `config.json` needed to size the classification head.
#[derive(Deserialize)]
struct HeadConfig {
    dim: usize,
}

/// `DistilBertForSequenceClassification`: encoder, then the `[CLS]` hidden
/// state through `pre_classifier` → ReLU → `classifier`.
pub struct DistilBertSequenceModel {
    encoder: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    device: Device,
}

impl DistilBertSequenceModel {
    pub fn load(model_dir: &Path, num_labels: usize) -> Result<Self> {
        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: DistilBertConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid DistilBERT config {}", config_path.display()))?;
        let head: HeadConfig = serde_json::from_str(&raw)?;

        let device = Device::cuda_if_available(0)?;
        let weights = model_dir.join("model.safetensors");
        let tensors = candle_core::safetensors::load(&weights, &device)
            .with_context(|| format!("Failed to read weights {}", weights.display()))?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);

        let encoder = DistilBertModel::load(vb.pp("distilbert"), &config)?;
        let pre_classifier = linear(head.dim, head.dim, vb.pp("pre_classifier"))?;
        let classifier = linear(head.dim, num_labels, vb.pp("classifier"))?;

        Ok(Self {
            encoder,
            pre_classifier,
            classifier,
            device,
        })
    }
}

impl SequenceModel for DistilBertSequenceModel {
    fn logits(&self, encoded: &EncodedText) -> Result<Vec<f32>> {
        let len = encoded.len();
        let input_ids = Tensor::new(encoded.input_ids.as_slice(), &self.device)?.unsqueeze(0)?;

        // Non-zero entries are masked out of attention.
        let padding: Vec<u8> = encoded
            .attention_mask
            .iter()
            .map(|&m| u8::from(m == 0))
            .collect();
        let mask = Tensor::from_vec(padding, (1, 1, 1, len), &self.device)?;

        let hidden = self.encoder.forward(&input_ids, &mask)?;
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pre_classifier.forward(&cls)?.relu()?;
        let logits = self.classifier.forward(&pooled)?;

        Ok(logits.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?)
    }
}
