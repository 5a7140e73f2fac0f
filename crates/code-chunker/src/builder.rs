use crate::chunk::{Chunk, Declarations, EmbeddedChunk, LevelChunk};
use crate::declaration::DeclarationRules;
use crate::error::Result;
use crate::merger::{encode_all, ChunkMerger};
use crate::syntax::{NodeId, SyntaxTree};
use semchunk_embeddings::EmbeddingModel;
use std::sync::Arc;

/// Groups the children of a node into touching, token-bounded chunks.
///
/// Children whose own text exceeds `oversize_tokens` are split recursively; the nested
/// result is merged once and its first chunk is spliced onto the current one when the
/// two touch. The splice ignores the token ceiling, so a spliced chunk can outgrow
/// `max_sequence_length`. Every level carries the trail of declarations it sits inside.
pub struct ChunkBuilder<'a, M: EmbeddingModel + ?Sized> {
    tree: &'a SyntaxTree,
    model: &'a M,
    rules: DeclarationRules,
    oversize_tokens: usize,
    merger: &'a ChunkMerger<'a, M>,
}

impl<'a, M: EmbeddingModel + ?Sized> ChunkBuilder<'a, M> {
    pub const fn new(
        tree: &'a SyntaxTree,
        model: &'a M,
        rules: DeclarationRules,
        oversize_tokens: usize,
        merger: &'a ChunkMerger<'a, M>,
    ) -> Self {
        Self {
            tree,
            model,
            rules,
            oversize_tokens,
            merger,
        }
    }

    /// Chunk the whole file: the root with no enclosing declarations.
    pub fn build_root(&self) -> Result<Vec<EmbeddedChunk>> {
        self.build(self.tree.root(), &Vec::new(), 0)
    }

    /// Chunk the children of `node`.
    ///
    /// `cursor` is the end byte of whatever precedes `node`'s first child in the chunk
    /// list being assembled by the caller.
    pub fn build(
        &self,
        node: NodeId,
        declarations: &Declarations,
        mut cursor: usize,
    ) -> Result<Vec<EmbeddedChunk>> {
        let tree = self.tree;
        let max_tokens = self.model.max_sequence_length();

        let mut chunks: Vec<LevelChunk> = Vec::new();
        let mut chunk_tokens = 0;

        for &child in tree.children(node) {
            let span = tree.node(child);
            let token_count = self.model.token_count(tree.text(child))?;

            // Leaves cannot be split further and fall through as a single unit.
            if token_count > self.oversize_tokens && !tree.children(child).is_empty() {
                let mut nested = declarations.clone();
                if self.rules.is_declaration(tree, child) {
                    if let Some(declaration) = self.rules.extract(tree, child) {
                        nested.push(Arc::new(declaration));
                    }
                }

                let nested_chunks = self.build(child, &nested, cursor)?;
                let mut merged = self.merger.merge(tree, nested_chunks)?.into_iter();
                let Some(first) = merged.next() else {
                    continue;
                };

                let first_start = first
                    .chunk
                    .nodes
                    .first()
                    .map_or(span.start_byte, |id| tree.node(*id).start_byte);
                match chunks.last_mut() {
                    Some(last) if tree.touches(cursor, first_start) => {
                        let spliced = last.chunk().combine(&first.chunk);
                        *last = LevelChunk::Fresh(spliced);
                    }
                    _ => chunks.push(LevelChunk::Embedded(first)),
                }
                chunks.extend(merged.map(LevelChunk::Embedded));

                if let Some(last) = chunks.last() {
                    chunk_tokens = self.model.token_count(&last.chunk().dump(tree))?;
                    cursor = last.chunk().end_byte(tree);
                }
                continue;
            }

            if let Some(last) = chunks.last_mut() {
                if tree.touches(cursor, span.start_byte) && chunk_tokens + token_count < max_tokens
                {
                    last.fresh_mut().nodes.push(child);
                    chunk_tokens += token_count;
                    cursor = span.end_byte;
                    continue;
                }
            }

            chunks.push(LevelChunk::Fresh(Chunk::new(child, declarations.clone())));
            chunk_tokens = token_count;
            cursor = span.end_byte;
        }

        self.finish_level(chunks)
    }

    /// Strip self-referencing context, then encode every chunk without a vector in one batch.
    fn finish_level(&self, mut chunks: Vec<LevelChunk>) -> Result<Vec<EmbeddedChunk>> {
        for chunk in &mut chunks {
            chunk.drop_own_headers();
        }

        let dumps: Vec<String> = chunks
            .iter()
            .filter_map(|chunk| match chunk {
                LevelChunk::Fresh(chunk) => Some(chunk.dump(self.tree)),
                LevelChunk::Embedded(_) => None,
            })
            .collect();
        let mut vectors = encode_all(self.model, &dumps)?.into_iter();

        Ok(chunks
            .into_iter()
            .filter_map(|chunk| match chunk {
                LevelChunk::Embedded(embedded) => Some(embedded),
                LevelChunk::Fresh(chunk) => vectors
                    .next()
                    .map(|embedding| EmbeddedChunk::new(chunk, embedding)),
            })
            .collect())
    }
}
