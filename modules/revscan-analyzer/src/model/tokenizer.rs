use std::path::Path;

use anyhow::{Context, Result};
use tokenizers::Tokenizer;

use crate::classifier::{frame_sequence, EncodedText, SpecialTokens, TextEncoder, MAX_SEQUENCE_LENGTH};

/// WordPiece encoder read from a `tokenizer.json`. Special tokens and
/// fixed-length framing are applied by [`frame_sequence`], not by the
/// tokenizer's own truncation/padding settings.
pub struct TokenizerEncoder {
    tokenizer: Tokenizer,
    specials: SpecialTokens,
}

impl TokenizerEncoder {
    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        Self::from_file(&model_dir.join("tokenizer.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut tokenizer = Tokenizer::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load tokenizer from {}", path.display()))?;
        tokenizer
            .with_truncation(None)
            .map_err(anyhow::Error::msg)?;
        tokenizer.with_padding(None);

        let specials = SpecialTokens {
            cls: special_id(&tokenizer, "[CLS]")?,
            sep: special_id(&tokenizer, "[SEP]")?,
            pad: special_id(&tokenizer, "[PAD]")?,
        };
        Ok(Self {
            tokenizer,
            specials,
        })
    }
}

impl TextEncoder for TokenizerEncoder {
    fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(anyhow::Error::msg)?;
        Ok(frame_sequence(encoding.get_ids(), &self.specials, MAX_SEQUENCE_LENGTH))
    }
}

fn special_id(tokenizer: &Tokenizer, token: &str) -> Result<u32> {
    tokenizer
        .token_to_id(token)
        .with_context(|| format!("tokenizer vocabulary has no {token} token"))
}
