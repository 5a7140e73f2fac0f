use crate::error::{EmbeddingError, Result};
use crate::model::EmbeddingModel;
use crate::vector::normalize;
use crate::{DEFAULT_DIMENSION, DEFAULT_MAX_SEQUENCE_LENGTH};
use unicode_segmentation::UnicodeSegmentation;

/// Leading + trailing special tokens added by transformer tokenizers.
const SPECIAL_TOKENS: usize = 2;

/// Offline, deterministic embedding model.
///
/// Tokens are the non-whitespace word-boundary segments of the text. Each token is
/// hashed into one signed bucket of the output vector, so texts that share
/// identifiers and keywords point in similar directions.
#[derive(Debug, Clone)]
pub struct HashingModel {
    dimension: usize,
    max_sequence_length: usize,
}

impl HashingModel {
    pub fn new(dimension: usize, max_sequence_length: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(EmbeddingError::ModelInitialization(
                "dimension must be > 0".to_string(),
            ));
        }
        if max_sequence_length <= SPECIAL_TOKENS {
            return Err(EmbeddingError::ModelInitialization(format!(
                "max_sequence_length must exceed {SPECIAL_TOKENS}"
            )));
        }
        Ok(Self {
            dimension,
            max_sequence_length,
        })
    }

    fn tokens(text: &str) -> impl Iterator<Item = &str> {
        text.split_word_bounds()
            .filter(|segment| !segment.trim().is_empty())
    }
}

impl Default for HashingModel {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        }
    }
}

impl EmbeddingModel for HashingModel {
    fn token_count(&self, text: &str) -> Result<usize> {
        Ok(Self::tokens(text).count() + SPECIAL_TOKENS)
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vec = vec![0.0f32; self.dimension];
        for token in Self::tokens(text) {
            let mut state = fnv1a_64(token.as_bytes());
            let bits = splitmix64(&mut state);
            let bucket = (bits % self.dimension as u64) as usize;
            if bits >> 63 == 0 {
                vec[bucket] += 1.0;
            } else {
                vec[bucket] -= 1.0;
            }
        }
        normalize(&mut vec);
        Ok(vec)
    }

    fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_count_includes_special_tokens() {
        let model = HashingModel::default();
        assert_eq!(model.token_count("").unwrap(), 2);
        assert_eq!(model.token_count("a = 1").unwrap(), 5);
        assert_eq!(model.token_count("def foo():").unwrap(), 7);
    }

    #[test]
    fn encode_is_deterministic_and_normalized() {
        let model = HashingModel::new(64, 128).unwrap();
        let a = model.encode("fn main() { println!(\"hi\"); }").unwrap();
        let b = model.encode("fn main() { println!(\"hi\"); }").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let model = HashingModel::default();
        let a = model.encode("total = total + price * quantity").unwrap();
        let b = model.encode("total = total + price * count").unwrap();
        let c = model.encode("class Renderer: pass").unwrap();
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn empty_text_encodes_to_zero_vector() {
        let model = HashingModel::new(8, 16).unwrap();
        assert_eq!(model.encode("   \n").unwrap(), vec![0.0; 8]);
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(HashingModel::new(0, 512).is_err());
        assert!(HashingModel::new(16, 2).is_err());
    }
}
