use crate::chunk::EmbeddedChunk;
use crate::error::Result;
use crate::syntax::SyntaxTree;
use semchunk_embeddings::{cosine_similarity, EmbeddingError, EmbeddingModel};

/// Fuses embedding-similar neighbours in one left-to-right sweep.
///
/// During the sweep a merged chunk carries the mean of its halves' vectors; the real
/// encoding is computed once per merged chunk after the sweep. The sweep never revisits a
/// position to its left, so the result is not a fixpoint.
pub struct ChunkMerger<'m, M: EmbeddingModel + ?Sized> {
    model: &'m M,
    similarity_threshold: f64,
}

impl<'m, M: EmbeddingModel + ?Sized> ChunkMerger<'m, M> {
    pub const fn new(model: &'m M, similarity_threshold: f64) -> Self {
        Self {
            model,
            similarity_threshold,
        }
    }

    pub fn merge(
        &self,
        tree: &SyntaxTree,
        mut chunks: Vec<EmbeddedChunk>,
    ) -> Result<Vec<EmbeddedChunk>> {
        let max_tokens = self.model.max_sequence_length();
        let before = chunks.len();

        let mut i = 0;
        while i + 1 < chunks.len() {
            let similarity = cosine_similarity(&chunks[i].embedding, &chunks[i + 1].embedding);
            if f64::from(similarity) > self.similarity_threshold {
                let combined = chunks[i].combine(&chunks[i + 1])?;
                let tokens = self.model.token_count(&combined.chunk.dump(tree))?;
                if tokens < max_tokens {
                    chunks[i] = combined;
                    chunks.remove(i + 1);
                    // compare the grown chunk with its new neighbour
                    continue;
                }
            }
            i += 1;
        }

        let pending: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.pending_recompute)
            .map(|(index, _)| index)
            .collect();
        if !pending.is_empty() {
            let dumps: Vec<String> = pending
                .iter()
                .map(|index| chunks[*index].chunk.dump(tree))
                .collect();
            for (index, embedding) in pending.into_iter().zip(encode_all(self.model, &dumps)?) {
                chunks[index].embedding = embedding;
                chunks[index].pending_recompute = false;
            }
        }

        if chunks.len() < before {
            log::debug!("Merged {before} chunks into {}", chunks.len());
        }
        Ok(chunks)
    }
}

/// Batch-encode `texts`, checking the model returned one vector per text.
pub(crate) fn encode_all<M: EmbeddingModel + ?Sized>(
    model: &M,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let vectors = model.encode_batch(texts)?;
    if vectors.len() != texts.len() {
        return Err(EmbeddingError::EmbeddingGeneration(format!(
            "model returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        ))
        .into());
    }
    Ok(vectors)
}
