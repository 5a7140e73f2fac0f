use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source file handed to the chunker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Repository-relative path
    pub path: String,

    /// Full file text
    pub text: String,

    /// Repository namespace the file belongs to
    pub repo_id: i64,

    /// Grammar used to parse `text`
    pub language: Language,
}

impl Document {
    /// Create a document, detecting the language from the path extension
    pub fn new(path: impl Into<String>, text: impl Into<String>, repo_id: i64) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self {
            path,
            text: text.into(),
            repo_id,
            language,
        }
    }

    /// Builder: override the detected language
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// A finished chunk, ready to be stored and searched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Position in the document's chunk list
    pub index: usize,

    /// Line the chunk starts on (1-indexed, counted over emitted content)
    pub first_line_number: usize,

    /// Headers of the enclosing declarations, each followed by an elided body line
    pub context: String,

    /// Source text of the chunk, without leading or trailing newlines
    pub content: String,

    /// Source file path
    pub path: String,

    /// Lowercase hex SHA-256 over path, index and dump
    pub hash: String,

    /// Tokens in `context + content`
    pub token_count: usize,

    pub embedding: Vec<f32>,

    pub repo_id: i64,

    pub language: String,
}

impl DocumentChunk {
    /// Text the embedding was computed from
    #[must_use]
    pub fn dump_for_embedding(&self) -> String {
        format!("{}{}", self.context, self.content)
    }

    /// Text shown to a language model, labelled with its location
    #[must_use]
    pub fn dump_for_llm(&self, repo_name: &str) -> String {
        format!(
            "[\"{}\" in repo \"{}\"]\n{}{}",
            self.path, repo_name, self.context, self.content
        )
    }

    /// Key unique within one repository namespace
    #[must_use]
    pub fn identity(&self) -> (i64, &str, usize) {
        (self.repo_id, &self.path, self.index)
    }

    /// Check if the chunk starts at or before `line` and covers it
    #[must_use]
    pub fn contains_line(&self, line: usize) -> bool {
        let lines = self.content.split('\n').count();
        line >= self.first_line_number && line < self.first_line_number + lines
    }
}

impl fmt::Display for DocumentChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]\n{}{}", self.path, self.context, self.content)
    }
}
