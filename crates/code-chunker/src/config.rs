use serde::{Deserialize, Serialize};

/// Configuration for chunk construction and merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkerConfig {
    /// Token count above which a node is split into its children instead of
    /// being treated as one unit. Keep it below the model's sequence limit.
    pub oversize_tokens: usize,

    /// Neighbouring chunks merge only when their cosine similarity exceeds this.
    pub similarity_threshold: f64,

    /// Also run the merge sweep over the file's top-level chunk list
    pub merge_top_level: bool,

    /// Languages to accept (empty = every language with a grammar)
    pub supported_languages: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            oversize_tokens: 512,
            similarity_threshold: 0.7,
            merge_top_level: false,
            supported_languages: vec![],
        }
    }
}

impl ChunkerConfig {
    /// Create config for encoders with short context windows (256 tokens)
    pub fn for_small_models() -> Self {
        Self {
            oversize_tokens: 256,
            ..Default::default()
        }
    }

    /// Create config for long-context encoders (8k tokens and up)
    pub fn for_large_models() -> Self {
        Self {
            oversize_tokens: 1024,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.oversize_tokens == 0 {
            return Err("oversize_tokens must be > 0".to_string());
        }

        if !self.similarity_threshold.is_finite()
            || !(-1.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(format!(
                "similarity_threshold ({}) must be within [-1, 1]",
                self.similarity_threshold
            ));
        }

        Ok(())
    }

    /// Whether `language` passes the `supported_languages` filter
    pub fn accepts_language(&self, language: &str) -> bool {
        self.supported_languages.is_empty()
            || self
                .supported_languages
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(language))
    }
}
