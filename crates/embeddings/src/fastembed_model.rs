use crate::error::{EmbeddingError, Result};
use crate::model::EmbeddingModel;
use fastembed::{EmbeddingModel as FastEmbedModelKind, InitOptions, TextEmbedding};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

/// Models available through the ONNX backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnnxModelKind {
    /// all-MiniLM-L6-v2 (384 dims, fast)
    AllMiniLmL6V2,
    /// bge-small-en-v1.5 (384 dims)
    BgeSmallEnV15,
    /// nomic-embed-text-v1.5 (768 dims, tuned for code and prose)
    NomicEmbedTextV15,
}

impl OnnxModelKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all-minilm-l6-v2" | "minilm" => Ok(Self::AllMiniLmL6V2),
            "bge-small-en-v1.5" | "bge-small" => Ok(Self::BgeSmallEnV15),
            "nomic-embed-text-v1.5" | "nomic" => Ok(Self::NomicEmbedTextV15),
            other => Err(EmbeddingError::ModelInitialization(format!(
                "Unknown embedding model '{other}'"
            ))),
        }
    }

    const fn dimension(self) -> usize {
        match self {
            Self::AllMiniLmL6V2 | Self::BgeSmallEnV15 => 384,
            Self::NomicEmbedTextV15 => 768,
        }
    }

    fn to_fastembed(self) -> FastEmbedModelKind {
        match self {
            Self::AllMiniLmL6V2 => FastEmbedModelKind::AllMiniLML6V2,
            Self::BgeSmallEnV15 => FastEmbedModelKind::BGESmallENV15,
            Self::NomicEmbedTextV15 => FastEmbedModelKind::NomicEmbedTextV15,
        }
    }
}

/// Embedding model backed by ONNX Runtime.
///
/// Token counts come from the model's own `tokenizer.json` so chunk budgets match
/// what the encoder actually sees.
pub struct FastEmbedModel {
    model: TextEmbedding,
    tokenizer: Tokenizer,
    kind: OnnxModelKind,
    max_sequence_length: usize,
}

impl FastEmbedModel {
    pub fn new(
        kind: OnnxModelKind,
        tokenizer_path: &Path,
        max_sequence_length: usize,
        cache_dir: Option<PathBuf>,
    ) -> Result<Self> {
        info!("Initializing ONNX embedding model {kind:?} (max {max_sequence_length} tokens)");

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            EmbeddingError::ModelInitialization(format!(
                "Tokenizer load failed for {}: {e}",
                tokenizer_path.display()
            ))
        })?;
        // Counting must see the whole text, never a truncated or padded encoding.
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(None)
            .map_err(|e| EmbeddingError::ModelInitialization(format!("{e}")))?;

        let mut options = InitOptions::new(kind.to_fastembed())
            .with_max_length(max_sequence_length)
            .with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }
        let model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::ModelInitialization(e.to_string()))?;

        Ok(Self {
            model,
            tokenizer,
            kind,
            max_sequence_length,
        })
    }

    #[must_use]
    pub const fn kind(&self) -> OnnxModelKind {
        self.kind
    }
}

impl EmbeddingModel for FastEmbedModel {
    fn token_count(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;
        Ok(encoding.get_ids().len())
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.encode_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingGeneration("No embedding generated".into()))
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Encoding {} texts", texts.len());
        let vectors = self
            .model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::EmbeddingGeneration(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::EmbeddingGeneration(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    fn dimension(&self) -> usize {
        self.kind.dimension()
    }
}
