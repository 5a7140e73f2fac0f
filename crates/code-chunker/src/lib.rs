//! # Semchunk Chunker
//!
//! Syntax-aware, token-bounded code chunking for embedding and retrieval.
//!
//! ## Philosophy
//!
//! Chunks follow the syntax tree, never arbitrary line windows:
//! - Adjacent nodes with at most a line break between them stay together
//! - Nodes too large for one chunk are split along their children
//! - Split-off pieces carry the headers of the declarations they sit inside
//! - Neighbours that embed alike are merged back while they fit the model
//!
//! ## Architecture
//!
//! ```text
//! Document
//!     │
//!     ├──> Tree-sitter Parsing → SyntaxTree (arena, NodeId per node)
//!     │
//!     ├──> ChunkBuilder (recursive, per level)
//!     │    ├─> Group touching children under the token ceiling
//!     │    ├─> Descend into oversize children, pushing DeclarationContext
//!     │    └─> ChunkMerger over every nested result (mean, then re-encode)
//!     │
//!     └──> ChunkEmitter
//!          └─> DocumentChunk[] with context, line numbers, hash, token count
//! ```
//!
//! ## Example
//!
//! ```rust
//! use semchunk_chunker::{ChunkerConfig, Document, DocumentChunker};
//! use semchunk_embeddings::HashingModel;
//!
//! let chunker = DocumentChunker::new(ChunkerConfig::default(), HashingModel::default()).unwrap();
//!
//! let code = r#"
//! def process_data(text):
//!     cleaned = text.strip()
//!     return cleaned.upper()
//! "#;
//!
//! let chunks = chunker
//!     .process_document(&Document::new("example.py", code, 1))
//!     .unwrap();
//! for chunk in chunks {
//!     println!("Chunk {} at line {}: {}", chunk.index, chunk.first_line_number, chunk.hash);
//! }
//! ```

mod builder;
mod chunk;
mod chunker;
mod config;
mod declaration;
mod emitter;
mod error;
mod language;
mod merger;
mod syntax;
mod types;

pub use builder::ChunkBuilder;
pub use chunk::{Chunk, Declarations, EmbeddedChunk};
pub use chunker::{BatchReport, ChunkingStats, DocumentChunker, DocumentFailure};
pub use config::ChunkerConfig;
pub use declaration::{DeclarationContext, DeclarationRules};
pub use emitter::{chunk_hash, ChunkEmitter};
pub use error::{ChunkerError, Result};
pub use language::Language;
pub use merger::ChunkMerger;
pub use syntax::{NodeId, SyntaxNode, SyntaxTree};
pub use types::{Document, DocumentChunk};
