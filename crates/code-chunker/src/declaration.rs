//! Declaration headers echoed as context for chunks nested inside a scope.

use crate::language::Language;
use crate::syntax::{NodeId, SyntaxTree};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Header span of one enclosing class/function-like declaration.
///
/// Equality and hashing use `id` only: two contexts are the same declaration iff they
/// were extracted from the same node.
#[derive(Debug, Clone)]
pub struct DeclarationContext {
    pub id: NodeId,
    pub header_start: usize,
    pub header_end: usize,
    pub body_indent: String,
    pub header_nodes: HashSet<NodeId>,
}

impl DeclarationContext {
    /// Literal header text, indentation included
    #[must_use]
    pub fn header<'t>(&self, tree: &'t SyntaxTree) -> &'t str {
        tree.slice(self.header_start, self.header_end)
    }

    /// Context block rendered for a nested chunk: the header, then an elided body line
    #[must_use]
    pub fn render(&self, tree: &SyntaxTree) -> String {
        format!("{}\n{}...\n", self.header(tree), self.body_indent)
    }

    /// Whether any of `nodes` belongs to this declaration's header
    pub fn overlaps<'a>(&self, mut nodes: impl Iterator<Item = &'a NodeId>) -> bool {
        nodes.any(|node| self.header_nodes.contains(node))
    }
}

impl PartialEq for DeclarationContext {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DeclarationContext {}

impl Hash for DeclarationContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Per-language declaration rules, selected once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationRules {
    /// Header closed by a `:` token among the node's own children.
    Colon,
    /// Header closed by the `{` opening a body child.
    Brace {
        kinds: &'static [&'static str],
        block_children: &'static [&'static str],
        bodies: &'static [&'static str],
    },
    /// No declarations are recognised.
    Unsupported,
}

const JS_KINDS: &[&str] = &[
    "class_declaration",
    "method_definition",
    "function_declaration",
    "lexical_declaration",
];
const TS_KINDS: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "interface_declaration",
    "method_definition",
    "function_declaration",
    "lexical_declaration",
];
const RUST_KINDS: &[&str] = &["function_item", "impl_item", "trait_item", "mod_item"];

impl DeclarationRules {
    #[must_use]
    pub const fn for_language(language: Language) -> Self {
        match language {
            Language::Python => Self::Colon,
            Language::JavaScript => Self::Brace {
                kinds: JS_KINDS,
                block_children: &["statement_block"],
                bodies: &["class_body", "statement_block"],
            },
            Language::TypeScript | Language::Tsx => Self::Brace {
                kinds: TS_KINDS,
                block_children: &["statement_block"],
                bodies: &["class_body", "statement_block", "interface_body"],
            },
            Language::Rust => Self::Brace {
                kinds: RUST_KINDS,
                block_children: &["block", "declaration_list"],
                bodies: &["block", "declaration_list"],
            },
            Language::Go | Language::Unknown => Self::Unsupported,
        }
    }

    /// Whether `id` introduces a named scope
    #[must_use]
    pub fn is_declaration(&self, tree: &SyntaxTree, id: NodeId) -> bool {
        let node = tree.node(id);
        let has_child = |kinds: &[&str]| {
            tree.children(id)
                .iter()
                .any(|child| kinds.contains(&tree.node(*child).kind))
        };

        match self {
            Self::Colon => node.kind.ends_with("_definition") || has_child(&["block"]),
            Self::Brace {
                kinds,
                block_children,
                ..
            } => kinds.contains(&node.kind) || has_child(block_children),
            Self::Unsupported => false,
        }
    }

    /// Extract the header of declaration `id`.
    ///
    /// Returns `None` when the header delimiter cannot be found; chunks nested inside
    /// such a declaration simply get no context line for it.
    #[must_use]
    pub fn extract(&self, tree: &SyntaxTree, id: NodeId) -> Option<DeclarationContext> {
        match self {
            Self::Colon => extract_colon(tree, id),
            Self::Brace { bodies, .. } => extract_brace(tree, id, bodies),
            Self::Unsupported => None,
        }
    }
}

fn extract_colon(tree: &SyntaxTree, id: NodeId) -> Option<DeclarationContext> {
    let children = tree.children(id);
    let colon = children
        .iter()
        .position(|child| tree.node(*child).kind == ":")?;
    let first = *children.first()?;

    Some(DeclarationContext {
        id,
        header_start: tree.indent_start(tree.node(first).start_byte),
        header_end: tree.node(children[colon]).end_byte,
        body_indent: leading_indent(tree, children.get(colon + 1).copied()),
        header_nodes: children[..=colon].iter().copied().collect(),
    })
}

fn extract_brace(tree: &SyntaxTree, id: NodeId, bodies: &[&str]) -> Option<DeclarationContext> {
    let children = tree.children(id);
    let body_index = children
        .iter()
        .position(|child| bodies.contains(&tree.node(*child).kind))?;
    let body = children[body_index];

    let (brace_index, brace) = find_brace(tree, body)?;
    let body_children = tree.children(body);
    let brace_siblings = tree.children(parent_of(tree, body, brace)?);
    let after_brace = brace_siblings
        .iter()
        .position(|sibling| *sibling == brace)
        .and_then(|at| brace_siblings.get(at + 1).copied());

    let header_nodes = children[..body_index]
        .iter()
        .chain(&body_children[..=brace_index])
        .copied()
        .collect();

    Some(DeclarationContext {
        id,
        header_start: tree.indent_start(tree.node(id).start_byte),
        header_end: tree.node(brace).end_byte,
        body_indent: leading_indent(tree, after_brace),
        header_nodes,
    })
}

/// First `{` under `body` in pre-order, with the index of the body child holding it.
fn find_brace(tree: &SyntaxTree, body: NodeId) -> Option<(usize, NodeId)> {
    tree.children(body)
        .iter()
        .enumerate()
        .find_map(|(index, child)| find_token(tree, *child, "{").map(|brace| (index, brace)))
}

fn find_token(tree: &SyntaxTree, id: NodeId, kind: &str) -> Option<NodeId> {
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if tree.node(current).kind == kind {
            return Some(current);
        }
        stack.extend(tree.children(current).iter().rev());
    }
    None
}

/// Parent of `target` within the subtree rooted at `ancestor`
fn parent_of(tree: &SyntaxTree, ancestor: NodeId, target: NodeId) -> Option<NodeId> {
    let mut stack = vec![ancestor];
    while let Some(current) = stack.pop() {
        let children = tree.children(current);
        if children.contains(&target) {
            return Some(current);
        }
        stack.extend(children.iter().rev());
    }
    None
}

fn leading_indent(tree: &SyntaxTree, next: Option<NodeId>) -> String {
    next.map(|id| {
        let start = tree.node(id).start_byte;
        tree.slice(tree.indent_start(start), start).to_string()
    })
    .unwrap_or_default()
}
