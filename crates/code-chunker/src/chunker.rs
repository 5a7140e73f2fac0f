use crate::builder::ChunkBuilder;
use crate::config::ChunkerConfig;
use crate::declaration::DeclarationRules;
use crate::emitter::ChunkEmitter;
use crate::error::{ChunkerError, Result};
use crate::merger::ChunkMerger;
use crate::syntax::SyntaxTree;
use crate::types::{Document, DocumentChunk};
use semchunk_embeddings::EmbeddingModel;
use serde::Serialize;
use std::time::Instant;

/// Main chunker interface: parse, build, merge and emit one document at a time
pub struct DocumentChunker<M: EmbeddingModel> {
    config: ChunkerConfig,
    model: M,
}

impl<M: EmbeddingModel> DocumentChunker<M> {
    /// Create a new chunker, rejecting invalid configuration
    pub fn new(config: ChunkerConfig, model: M) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        if config.oversize_tokens >= model.max_sequence_length() {
            log::warn!(
                "oversize_tokens ({}) is not below the model limit ({}); large nodes will not be split",
                config.oversize_tokens,
                model.max_sequence_length()
            );
        }
        Ok(Self { config, model })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Chunk one document. Nothing is returned for a document that fails part-way.
    pub fn process_document(&self, document: &Document) -> Result<Vec<DocumentChunk>> {
        let started = Instant::now();
        let language = document.language;
        if !language.has_grammar() || !self.config.accepts_language(language.as_str()) {
            return Err(ChunkerError::unsupported_language(language.as_str()));
        }

        let tree = SyntaxTree::parse(&document.text, language)?;
        let merger = ChunkMerger::new(&self.model, self.config.similarity_threshold);
        let builder = ChunkBuilder::new(
            &tree,
            &self.model,
            DeclarationRules::for_language(language),
            self.config.oversize_tokens,
            &merger,
        );

        let mut chunks = builder.build_root()?;
        if self.config.merge_top_level {
            chunks = merger.merge(&tree, chunks)?;
        }
        let emitted = ChunkEmitter::new(&self.model).emit(document, &tree, chunks)?;

        log::debug!(
            "Chunked {} into {} chunks in {:.2?}",
            document.path,
            emitted.len(),
            started.elapsed()
        );
        Ok(emitted)
    }

    /// Chunk documents in order; a failing document does not stop the rest.
    pub fn process_documents(&self, documents: &[Document]) -> BatchReport {
        self.run_batch(documents, None)
    }

    /// Like [`Self::process_documents`], but documents not started before `deadline`
    /// are skipped.
    pub fn process_documents_until(&self, documents: &[Document], deadline: Instant) -> BatchReport {
        self.run_batch(documents, Some(deadline))
    }

    fn run_batch(&self, documents: &[Document], deadline: Option<Instant>) -> BatchReport {
        let mut report = BatchReport::default();

        for (i, document) in documents.iter().enumerate() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                report.skipped = documents.len() - i;
                log::warn!("Deadline reached, skipping {} documents", report.skipped);
                break;
            }

            match self.process_document(document) {
                Ok(chunks) => report.chunks.extend(chunks),
                Err(e) => {
                    log::warn!("Failed to process document {}: {e}", document.path);
                    report.failures.push(DocumentFailure {
                        path: document.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
            log::debug!("Processed document {}/{}", i + 1, documents.len());
        }

        log::info!(
            "Chunked {} documents: {} chunks, {} failed, {} skipped",
            documents.len() - report.skipped,
            report.chunks.len(),
            report.failures.len(),
            report.skipped
        );
        report
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Chunks of every document that succeeded, in input order
    pub chunks: Vec<DocumentChunk>,
    pub failures: Vec<DocumentFailure>,
    /// Documents never started because the deadline passed
    pub skipped: usize,
}

impl BatchReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub path: String,
    pub error: String,
}

/// Statistics about chunking results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_tokens: usize,
    pub avg_tokens_per_chunk: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub chunks_with_context: usize,
}

impl ChunkingStats {
    #[must_use]
    pub fn from_chunks(chunks: &[DocumentChunk]) -> Self {
        let total_tokens: usize = chunks.iter().map(|chunk| chunk.token_count).sum();
        Self {
            total_chunks: chunks.len(),
            total_tokens,
            avg_tokens_per_chunk: total_tokens.checked_div(chunks.len()).unwrap_or(0),
            min_tokens: chunks
                .iter()
                .map(|chunk| chunk.token_count)
                .min()
                .unwrap_or(0),
            max_tokens: chunks
                .iter()
                .map(|chunk| chunk.token_count)
                .max()
                .unwrap_or(0),
            chunks_with_context: chunks
                .iter()
                .filter(|chunk| !chunk.context.is_empty())
                .count(),
        }
    }
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Tokens: {} | Avg: {} | Range: {}-{} | With context: {}",
            self.total_chunks,
            self.total_tokens,
            self.avg_tokens_per_chunk,
            self.min_tokens,
            self.max_tokens,
            self.chunks_with_context
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use pretty_assertions::assert_eq;
    use semchunk_embeddings::HashingModel;
    use std::time::Duration;

    const PYTHON_CODE: &str = r#"import os


def read(path):
    with open(path) as f:
        return f.read()


class Store:
    def __init__(self, root):
        self.root = root
"#;

    fn chunker() -> DocumentChunker<HashingModel> {
        DocumentChunker::new(ChunkerConfig::default(), HashingModel::default()).unwrap()
    }

    #[test]
    fn test_process_document() {
        let doc = Document::new("store.py", PYTHON_CODE, 1);
        let chunks = chunker().process_document(&doc).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "import os");
        assert!(chunks[2].content.starts_with("class Store:"));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.embedding.len(), 384);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChunkerConfig {
            oversize_tokens: 0,
            ..Default::default()
        };
        let result = DocumentChunker::new(config, HashingModel::default());
        assert!(matches!(result, Err(ChunkerError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_language_rejected() {
        let doc = Document::new("notes.txt", "hello", 1);
        assert!(matches!(
            chunker().process_document(&doc),
            Err(ChunkerError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_language_filter() {
        let config = ChunkerConfig {
            supported_languages: vec!["rust".to_string()],
            ..Default::default()
        };
        let chunker = DocumentChunker::new(config, HashingModel::default()).unwrap();
        let doc = Document::new("a.py", "x = 1\n", 1);
        assert!(chunker.process_document(&doc).is_err());
        let doc = Document::new("a.rs", "fn main() {}\n", 1);
        assert_eq!(chunker.process_document(&doc).unwrap().len(), 1);
    }

    #[test]
    fn test_top_level_merge_uses_configured_threshold() {
        let code = "a = 1\n\nb = 2\n\nc = 3\n";
        let chunk_count = |similarity_threshold: f64| {
            let config = ChunkerConfig {
                similarity_threshold,
                merge_top_level: true,
                ..Default::default()
            };
            DocumentChunker::new(config, HashingModel::default())
                .unwrap()
                .process_document(&Document::new("abc.py", code, 1))
                .unwrap()
                .len()
        };

        assert_eq!(chunk_count(-1.0), 1);
        assert_eq!(chunk_count(1.0), 3);
    }

    #[test]
    fn test_empty_document_has_no_chunks() {
        let doc = Document::new("empty.py", "", 1);
        assert!(chunker().process_document(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let docs = vec![
            Document::new("a.py", "x = 1\n", 1),
            Document::new("b.unknown", "???", 1),
            Document::new("c.py", "y = 2\n", 1),
        ];
        let report = chunker().process_documents(&docs);
        assert_eq!(report.chunks.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "b.unknown");
        assert_eq!(report.skipped, 0);
        assert!(!report.is_success());
    }

    #[test]
    fn test_expired_deadline_skips_everything() {
        let docs = vec![
            Document::new("a.py", "x = 1\n", 1),
            Document::new("b.py", "y = 2\n", 1),
        ];
        let deadline = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .unwrap_or_else(Instant::now);
        let report = chunker().process_documents_until(&docs, deadline);
        assert!(report.chunks.is_empty());
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn test_stats() {
        let doc = Document::new("store.py", PYTHON_CODE, 1).with_language(Language::Python);
        let chunks = chunker().process_document(&doc).unwrap();
        let stats = ChunkingStats::from_chunks(&chunks);

        assert_eq!(stats.total_chunks, chunks.len());
        assert!(stats.min_tokens <= stats.avg_tokens_per_chunk);
        assert!(stats.avg_tokens_per_chunk <= stats.max_tokens);
        assert_eq!(stats.chunks_with_context, 0);
        assert!(stats.to_string().starts_with("Chunks: 3 |"));

        assert_eq!(ChunkingStats::from_chunks(&[]), ChunkingStats::default());
    }
}
