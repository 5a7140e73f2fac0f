use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use clap::ValueEnum;
use semchunk_chunker::ChunkerConfig;
use semchunk_embeddings::{
    EmbeddingModel, HashingModel, DEFAULT_DIMENSION, DEFAULT_MAX_SEQUENCE_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const EMBEDDING_MODE_ENV: &str = "SEMCHUNK_EMBEDDING_MODE";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Offline feature-hashing model
    #[default]
    Hashing,
    /// ONNX encoder (requires the `fastembed` build feature)
    Fastembed,
}

impl EmbedMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hashing" | "stub" => Ok(Self::Hashing),
            "fastembed" | "fast" => Ok(Self::Fastembed),
            other => bail!("Unknown embedding mode '{other}' (expected hashing|fastembed)"),
        }
    }
}

/// `[embedding]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSettings {
    pub mode: EmbedMode,
    pub dimension: usize,
    pub max_sequence_length: usize,
    /// Model id for `fastembed` mode
    pub model: String,
    /// `tokenizer.json` used to count tokens in `fastembed` mode
    pub tokenizer_path: Option<PathBuf>,
    /// Where downloaded model files are kept
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            mode: EmbedMode::Hashing,
            dimension: DEFAULT_DIMENSION,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            model: "all-minilm-l6-v2".to_string(),
            tokenizer_path: None,
            cache_dir: None,
        }
    }
}

impl EmbeddingSettings {
    pub fn build_model(&self) -> Result<Box<dyn EmbeddingModel>> {
        match self.mode {
            EmbedMode::Hashing => {
                let model = HashingModel::new(self.dimension, self.max_sequence_length)
                    .context("Invalid [embedding] settings")?;
                Ok(Box::new(model))
            }
            EmbedMode::Fastembed => self.build_fastembed(),
        }
    }

    #[cfg(feature = "fastembed")]
    fn build_fastembed(&self) -> Result<Box<dyn EmbeddingModel>> {
        use semchunk_embeddings::{FastEmbedModel, OnnxModelKind};

        let kind = OnnxModelKind::parse(&self.model)?;
        let tokenizer_path = self
            .tokenizer_path
            .as_deref()
            .ok_or_else(|| anyhow!("embedding.tokenizer_path is required in fastembed mode"))?;
        let model = FastEmbedModel::new(
            kind,
            tokenizer_path,
            self.max_sequence_length,
            self.cache_dir.clone(),
        )
        .with_context(|| format!("Failed to load embedding model {}", self.model))?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "fastembed"))]
    fn build_fastembed(&self) -> Result<Box<dyn EmbeddingModel>> {
        Err(anyhow!(
            "Embedding mode 'fastembed' ({}) needs a build with the `fastembed` feature",
            self.model
        ))
    }
}

/// Effective configuration: file, then environment, then flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub chunker: ChunkerConfig,
    pub embedding: EmbeddingSettings,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub embed_mode: Option<EmbedMode>,
    pub oversize_tokens: Option<usize>,
    pub similarity_threshold: Option<f64>,
    pub merge_top_level: bool,
}

impl CliConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| anyhow!("Config parse error: {err}"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Layer the environment and flags on top, then validate.
    pub fn resolve(mut self, env_mode: Option<&str>, overrides: &Overrides) -> Result<Self> {
        if let Some(raw) = env_mode {
            self.embedding.mode =
                EmbedMode::parse(raw).with_context(|| format!("Invalid {EMBEDDING_MODE_ENV}"))?;
        }
        if let Some(mode) = overrides.embed_mode {
            self.embedding.mode = mode;
        }
        if let Some(tokens) = overrides.oversize_tokens {
            self.chunker.oversize_tokens = tokens;
        }
        if let Some(threshold) = overrides.similarity_threshold {
            self.chunker.similarity_threshold = threshold;
        }
        if overrides.merge_top_level {
            self.chunker.merge_top_level = true;
        }

        self.chunker
            .validate()
            .map_err(|err| anyhow!("Invalid [chunker] settings: {err}"))?;
        Ok(self)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render config as TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(CliConfig::from_toml("").unwrap(), CliConfig::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = CliConfig::from_toml(
            r#"
            [chunker]
            oversize_tokens = 128

            [embedding]
            mode = "fastembed"
            model = "bge-small-en-v1.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunker.oversize_tokens, 128);
        assert_eq!(config.chunker.similarity_threshold, 0.7);
        assert_eq!(config.embedding.mode, EmbedMode::Fastembed);
        assert_eq!(config.embedding.dimension, DEFAULT_DIMENSION);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CliConfig::from_toml("[embedding]\nmodle = \"x\"\n").is_err());
        assert!(CliConfig::from_toml("[chunkr]\n").is_err());
    }

    #[test]
    fn flags_override_environment_override_file() {
        let file = CliConfig::from_toml("[chunker]\noversize_tokens = 100\n").unwrap();

        let resolved = file
            .clone()
            .resolve(Some("fastembed"), &Overrides::default())
            .unwrap();
        assert_eq!(resolved.embedding.mode, EmbedMode::Fastembed);
        assert_eq!(resolved.chunker.oversize_tokens, 100);

        let overrides = Overrides {
            embed_mode: Some(EmbedMode::Hashing),
            oversize_tokens: Some(64),
            similarity_threshold: Some(0.9),
            merge_top_level: true,
        };
        let resolved = file.resolve(Some("fastembed"), &overrides).unwrap();
        assert_eq!(resolved.embedding.mode, EmbedMode::Hashing);
        assert_eq!(resolved.chunker.oversize_tokens, 64);
        assert!(resolved.chunker.merge_top_level);
    }

    #[test]
    fn invalid_values_fail_resolution() {
        assert!(CliConfig::default()
            .resolve(Some("gpu"), &Overrides::default())
            .is_err());

        let overrides = Overrides {
            similarity_threshold: Some(2.0),
            ..Overrides::default()
        };
        assert!(CliConfig::default().resolve(None, &overrides).is_err());
    }

    #[test]
    fn rendered_toml_parses_back() {
        let config = CliConfig::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[chunker]"));
        assert!(rendered.contains("similarity_threshold = 0.7\n"));
        assert!(rendered.contains("mode = \"hashing\""));
        assert_eq!(CliConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn hashing_model_follows_settings() {
        let settings = EmbeddingSettings {
            dimension: 32,
            max_sequence_length: 64,
            ..EmbeddingSettings::default()
        };
        let model = settings.build_model().unwrap();
        assert_eq!(model.dimension(), 32);
        assert_eq!(model.max_sequence_length(), 64);
    }
}
