use crate::error::Result;
use std::sync::Arc;

/// Tokenizer + encoder pair used to size and embed code chunks.
///
/// Implementations must be deterministic for a given input: the chunker relies on
/// `token_count` to enforce budgets and on `encode` to compare neighbouring chunks.
/// Errors are passed through to the caller untouched.
pub trait EmbeddingModel: Send + Sync {
    /// Number of model tokens `text` occupies, special tokens included.
    fn token_count(&self, text: &str) -> Result<usize>;

    /// Encode a single text into a `dimension()`-long vector.
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode many texts at once. Output order matches input order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    /// Hard ceiling on tokens per encoded sequence.
    fn max_sequence_length(&self) -> usize;

    /// Length of every vector produced by `encode`.
    fn dimension(&self) -> usize;
}

impl<M: EmbeddingModel + ?Sized> EmbeddingModel for &M {
    fn token_count(&self, text: &str) -> Result<usize> {
        (**self).token_count(text)
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        (**self).encode(text)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).encode_batch(texts)
    }

    fn max_sequence_length(&self) -> usize {
        (**self).max_sequence_length()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

impl<M: EmbeddingModel + ?Sized> EmbeddingModel for Arc<M> {
    fn token_count(&self, text: &str) -> Result<usize> {
        (**self).token_count(text)
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        (**self).encode(text)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).encode_batch(texts)
    }

    fn max_sequence_length(&self) -> usize {
        (**self).max_sequence_length()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

impl<M: EmbeddingModel + ?Sized> EmbeddingModel for Box<M> {
    fn token_count(&self, text: &str) -> Result<usize> {
        (**self).token_count(text)
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        (**self).encode(text)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).encode_batch(texts)
    }

    fn max_sequence_length(&self) -> usize {
        (**self).max_sequence_length()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}
