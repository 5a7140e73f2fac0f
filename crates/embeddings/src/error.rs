use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors raised by tokenizers and embedding models
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    #[error("Failed to initialize embedding model: {0}")]
    ModelInitialization(String),

    /// Failed to generate embeddings
    #[error("Failed to generate embeddings: {0}")]
    EmbeddingGeneration(String),

    /// Failed to tokenize input text
    #[error("Tokenization error: {0}")]
    Tokenization(String),

    /// Invalid input provided to the model
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
