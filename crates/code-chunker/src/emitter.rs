use crate::chunk::EmbeddedChunk;
use crate::error::Result;
use crate::syntax::SyntaxTree;
use crate::types::{Document, DocumentChunk};
use semchunk_embeddings::EmbeddingModel;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Content digest of one chunk: SHA-256 over `"[{path}][{index}]\n{dump}"`
#[must_use]
pub fn chunk_hash(path: &str, index: usize, dump: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("[{path}][{index}]\n{dump}").as_bytes());
    hex_encode_lower(&hasher.finalize())
}

fn hex_encode_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().saturating_mul(2));
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Turns a document's final chunk list into numbered, hashed records
pub struct ChunkEmitter<'m, M: EmbeddingModel + ?Sized> {
    model: &'m M,
}

impl<'m, M: EmbeddingModel + ?Sized> ChunkEmitter<'m, M> {
    pub const fn new(model: &'m M) -> Self {
        Self { model }
    }

    pub fn emit(
        &self,
        document: &Document,
        tree: &SyntaxTree,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<Vec<DocumentChunk>> {
        let mut line = 1;
        let mut emitted = Vec::with_capacity(chunks.len());

        for (index, embedded) in chunks.into_iter().enumerate() {
            let context = embedded.chunk.context(tree);
            let content = embedded.chunk.content(tree).trim_matches('\n').to_string();
            let dump = embedded.chunk.dump(tree);

            let chunk = DocumentChunk {
                index,
                first_line_number: line,
                hash: chunk_hash(&document.path, index, &dump),
                token_count: self.model.token_count(&dump)?,
                context,
                content,
                path: document.path.clone(),
                embedding: embedded.embedding,
                repo_id: document.repo_id,
                language: document.language.as_str().to_string(),
            };

            line += chunk.content.split('\n').count();
            emitted.push(chunk);
        }

        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::language::Language;
    use pretty_assertions::assert_eq;
    use semchunk_embeddings::HashingModel;

    #[test]
    fn hash_is_sha256_hex() {
        let hash = chunk_hash("a.py", 0, "x = 1");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, chunk_hash("a.py", 0, "x = 1"));
    }

    #[test]
    fn hash_depends_on_every_input() {
        let base = chunk_hash("a.py", 0, "x = 1");
        assert_ne!(base, chunk_hash("b.py", 0, "x = 1"));
        assert_ne!(base, chunk_hash("a.py", 1, "x = 1"));
        assert_ne!(base, chunk_hash("a.py", 0, "x = 2"));
    }

    #[test]
    fn known_digest() {
        // sha256("[p][0]\n")
        let mut hasher = Sha256::new();
        hasher.update(b"[p][0]\n");
        assert_eq!(chunk_hash("p", 0, ""), hex_encode_lower(&hasher.finalize()));
    }

    #[test]
    fn line_numbers_follow_emitted_content() {
        let source = "a = 1\nb = 2\n\n\nc = 3\nd = 4\ne = 5\n";
        let document = Document::new("m.py", source, 3);
        let tree = SyntaxTree::parse(source, Language::Python).unwrap();
        let nodes = tree.children(tree.root()).to_vec();
        let model = HashingModel::default();

        let chunks = vec![
            EmbeddedChunk::new(
                Chunk {
                    nodes: nodes[..2].to_vec(),
                    declarations: vec![],
                },
                vec![1.0],
            ),
            EmbeddedChunk::new(
                Chunk {
                    nodes: nodes[2..].to_vec(),
                    declarations: vec![],
                },
                vec![1.0],
            ),
        ];

        let emitted = ChunkEmitter::new(&model).emit(&document, &tree, chunks).unwrap();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].index, 0);
        assert_eq!(emitted[0].first_line_number, 1);
        assert_eq!(emitted[0].content, "a = 1\nb = 2");
        // blank separator lines are not counted
        assert_eq!(emitted[1].first_line_number, 3);
        assert_eq!(emitted[1].content, "c = 3\nd = 4\ne = 5");
        assert_eq!(emitted[1].repo_id, 3);
        assert_eq!(emitted[1].language, "python");
        assert_eq!(
            emitted[1].token_count,
            model.token_count("c = 3\nd = 4\ne = 5").unwrap()
        );
        assert_eq!(emitted[1].hash, chunk_hash("m.py", 1, "c = 3\nd = 4\ne = 5"));
    }
}
