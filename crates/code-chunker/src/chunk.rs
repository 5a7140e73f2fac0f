use crate::declaration::DeclarationContext;
use crate::syntax::{NodeId, SyntaxTree};
use semchunk_embeddings::{mean, Result as EmbeddingResult};
use std::sync::Arc;

/// Ordered declaration trail, outermost first. Shared between chunks of one level.
pub type Declarations = Vec<Arc<DeclarationContext>>;

/// Contiguous run of sibling-or-descendant nodes grouped for one embedding
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub nodes: Vec<NodeId>,
    pub declarations: Declarations,
}

impl Chunk {
    #[must_use]
    pub fn new(node: NodeId, declarations: Declarations) -> Self {
        Self {
            nodes: vec![node],
            declarations,
        }
    }

    /// End of the last node, or 0 for an empty chunk
    #[must_use]
    pub fn end_byte(&self, tree: &SyntaxTree) -> usize {
        self.nodes.last().map_or(0, |last| tree.node(*last).end_byte)
    }

    /// Source from the indentation-extended start of the first node through the end of
    /// the last one.
    #[must_use]
    pub fn content<'t>(&self, tree: &'t SyntaxTree) -> &'t str {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => tree.slice(
                tree.indent_start(tree.node(*first).start_byte),
                tree.node(*last).end_byte,
            ),
            _ => "",
        }
    }

    /// Rendered headers of every enclosing declaration
    #[must_use]
    pub fn context(&self, tree: &SyntaxTree) -> String {
        self.declarations
            .iter()
            .map(|declaration| declaration.render(tree))
            .collect()
    }

    /// Text that gets tokenized and embedded: context followed by content
    #[must_use]
    pub fn dump(&self, tree: &SyntaxTree) -> String {
        let mut dump = self.context(tree);
        dump.push_str(self.content(tree));
        dump
    }

    /// Concatenate nodes, keeping only the declarations both halves sit inside.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let mut nodes = Vec::with_capacity(self.nodes.len() + other.nodes.len());
        nodes.extend_from_slice(&self.nodes);
        nodes.extend_from_slice(&other.nodes);

        let declarations = self
            .declarations
            .iter()
            .filter(|declaration| other.declarations.contains(declaration))
            .cloned()
            .collect();

        Self {
            nodes,
            declarations,
        }
    }

    /// Drop declarations whose header is part of this chunk
    pub fn drop_own_headers(&mut self) {
        let nodes = &self.nodes;
        self.declarations
            .retain(|declaration| !declaration.overlaps(nodes.iter()));
    }
}

/// Chunk with a vector attached
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
    /// Set when `embedding` is a mean of two merged vectors rather than an encoding
    pub pending_recompute: bool,
}

impl EmbeddedChunk {
    #[must_use]
    pub const fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            chunk,
            embedding,
            pending_recompute: false,
        }
    }

    /// Combine with the right-hand neighbour, approximating the vector by the mean.
    pub fn combine(&self, other: &Self) -> EmbeddingResult<Self> {
        Ok(Self {
            chunk: self.chunk.combine(&other.chunk),
            embedding: mean(&self.embedding, &other.embedding)?,
            pending_recompute: true,
        })
    }
}

/// Chunk under construction at one recursion level
#[derive(Debug, Clone)]
pub enum LevelChunk {
    /// Still needs an encoding
    Fresh(Chunk),
    /// Returned by a nested level with its vector intact
    Embedded(EmbeddedChunk),
}

impl LevelChunk {
    #[must_use]
    pub const fn chunk(&self) -> &Chunk {
        match self {
            Self::Fresh(chunk) => chunk,
            Self::Embedded(embedded) => &embedded.chunk,
        }
    }

    /// Mutable access for growing the chunk. Any cached vector is discarded, so the
    /// chunk is encoded again when its level finishes.
    pub fn fresh_mut(&mut self) -> &mut Chunk {
        if let Self::Embedded(embedded) = self {
            let chunk = std::mem::take(&mut embedded.chunk);
            *self = Self::Fresh(chunk);
        }
        match self {
            Self::Fresh(chunk) => chunk,
            Self::Embedded(embedded) => &mut embedded.chunk,
        }
    }

    pub fn drop_own_headers(&mut self) {
        match self {
            Self::Fresh(chunk) => chunk.drop_own_headers(),
            Self::Embedded(embedded) => embedded.chunk.drop_own_headers(),
        }
    }
}
