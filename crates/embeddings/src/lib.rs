//! # Semchunk Embeddings
//!
//! Tokenizer and embedding models used to size and compare code chunks.
//!
//! ## Models
//!
//! - [`HashingModel`]: offline, deterministic feature-hashing model (default)
//! - `FastEmbedModel`: ONNX Runtime encoder with a HuggingFace tokenizer
//!   (enable the `fastembed` feature)
//!
//! ## Example
//!
//! ```rust
//! use semchunk_embeddings::{cosine_similarity, EmbeddingModel, HashingModel};
//!
//! let model = HashingModel::default();
//! let a = model.encode("fn add(a: i32, b: i32) -> i32 { a + b }").unwrap();
//! let b = model.encode("fn sub(a: i32, b: i32) -> i32 { a - b }").unwrap();
//! assert!(cosine_similarity(&a, &b) > 0.5);
//! ```

mod error;
#[cfg(feature = "fastembed")]
mod fastembed_model;
mod hashing;
mod model;
mod vector;

pub use error::{EmbeddingError, Result};
#[cfg(feature = "fastembed")]
pub use fastembed_model::{FastEmbedModel, OnnxModelKind};
pub use hashing::HashingModel;
pub use model::EmbeddingModel;
pub use vector::{cosine_similarity, mean, normalize};

/// Default vector length of the hashing model
pub const DEFAULT_DIMENSION: usize = 384;

/// Default token ceiling, matching common sentence-transformer encoders
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;
