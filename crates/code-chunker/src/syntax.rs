//! Arena copy of a tree-sitter parse.
//!
//! The chunker never holds tree-sitter nodes directly: every node is copied once into
//! a flat arena and addressed by [`NodeId`], which doubles as the node's identity for
//! declaration bookkeeping.

use crate::error::{ChunkerError, Result};
use crate::language::Language;
use tree_sitter::Parser;

/// Position of a node in its [`SyntaxTree`], assigned in pre-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One syntax node: type tag, byte span and ordered children (named and anonymous).
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub start_byte: usize,
    pub end_byte: usize,
    children: Vec<NodeId>,
}

impl SyntaxNode {
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Parsed source file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    /// Parse `source` with the grammar for `language`
    pub fn parse(source: &str, language: Language) -> Result<Self> {
        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ChunkerError::parse(format!("Failed to set language: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ChunkerError::parse("Failed to parse source code"))?;

        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut stack = vec![(tree.root_node(), None::<NodeId>)];
        while let Some((node, parent)) = stack.pop() {
            let id = NodeId(nodes.len());
            nodes.push(SyntaxNode {
                kind: node.kind(),
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                children: Vec::with_capacity(node.child_count()),
            });
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }

            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }

        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Literal text spanned by `id`
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        let node = self.node(id);
        self.slice(node.start_byte, node.end_byte)
    }

    /// Source text between two byte offsets; empty when the range is inverted.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.source.len());
        if start >= end {
            return "";
        }
        &self.source[start..end]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk `offset` back to the start of its line when only spaces or tabs precede it
    /// on that line, so a chunk can take its own indentation along.
    #[must_use]
    pub fn indent_start(&self, offset: usize) -> usize {
        let bytes = self.source.as_bytes();
        let offset = offset.min(bytes.len());
        let line_start = bytes[..offset]
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |newline| newline + 1);
        if bytes[line_start..offset]
            .iter()
            .all(|b| *b == b' ' || *b == b'\t')
        {
            line_start
        } else {
            offset
        }
    }

    /// A node starting at `start` touches whatever ended at `cursor` when at most one
    /// newline separates them.
    #[must_use]
    pub fn touches(&self, cursor: usize, start: usize) -> bool {
        self.slice(cursor, start)
            .bytes()
            .filter(|b| *b == b'\n')
            .count()
            < 2
    }
}
