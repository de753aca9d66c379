use std::sync::Arc;

use carve_core::{DocumentVersion, LineIndex, TextRange, TextSize};
use serde::{Deserialize, Serialize};

use crate::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TokenId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxElement {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: SyntaxKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<SyntaxElement>,
    pub(crate) range: TextRange,
    /// Exclusive end of this node's subtree in preorder node numbering.
    pub(crate) subtree_end: u32,
    /// Tokens owned (at any depth) by this node: `tokens[first_token..token_end]`.
    pub(crate) first_token: u32,
    pub(crate) token_end: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct TokenData {
    pub(crate) kind: SyntaxKind,
    pub(crate) range: TextRange,
    pub(crate) parent: NodeId,
}

/// An immutable, arena-allocated concrete syntax tree.
///
/// Nodes are numbered in preorder and tokens in document order, so both
/// "descendants of" and "tokens under" are contiguous index ranges. There are
/// no parent pointers to chase at runtime beyond the stored parent index; all
/// navigation goes through the query methods on the tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    text: Arc<str>,
    version: DocumentVersion,
    nodes: Vec<NodeData>,
    tokens: Vec<TokenData>,
    line_index: LineIndex,
}

impl SyntaxTree {
    pub(crate) fn from_parts(
        text: Arc<str>,
        version: DocumentVersion,
        nodes: Vec<NodeData>,
        tokens: Vec<TokenData>,
    ) -> Self {
        let line_index = LineIndex::new(&text);
        Self {
            text,
            version,
            nodes,
            tokens,
            line_index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> DocumentVersion {
        self.version
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn text_len(&self) -> TextSize {
        TextSize::of(&*self.text)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// A copy of this tree stamped with a different document version.
    #[must_use]
    pub fn with_version(&self, version: DocumentVersion) -> SyntaxTree {
        SyntaxTree {
            version,
            ..self.clone()
        }
    }

    fn node(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()]
    }

    fn token(&self, token: TokenId) -> &TokenData {
        &self.tokens[token.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    // --- Nodes ---

    pub fn kind(&self, node: NodeId) -> SyntaxKind {
        self.node(node).kind
    }

    /// Full range of a node, including leading and trailing trivia.
    pub fn full_range(&self, node: NodeId) -> TextRange {
        self.node(node).range
    }

    /// Range of a node from its first to its last non-trivia token. Nodes
    /// without any significant tokens fall back to their full range.
    pub fn node_span(&self, node: NodeId) -> TextRange {
        match (self.first_token(node), self.last_token(node)) {
            (Some(first), Some(last)) => {
                TextRange::new(self.token_range(first).start(), self.token_range(last).end())
            }
            _ => self.full_range(node),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// `node` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |&n| self.parent(n))
    }

    pub fn children(&self, node: NodeId) -> &[SyntaxElement] {
        &self.node(node).children
    }

    pub fn child_nodes(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node).iter().filter_map(|child| match child {
            SyntaxElement::Node(node) => Some(*node),
            SyntaxElement::Token(_) => None,
        })
    }

    pub fn child_tokens(&self, node: NodeId) -> impl Iterator<Item = TokenId> + '_ {
        self.children(node).iter().filter_map(|child| match child {
            SyntaxElement::Token(token) => Some(*token),
            SyntaxElement::Node(_) => None,
        })
    }

    pub fn child_node_of_kind(&self, node: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.child_nodes(node).find(|&child| self.kind(child) == kind)
    }

    pub fn has_child_token(&self, node: NodeId, kind: SyntaxKind) -> bool {
        self.child_tokens(node)
            .any(|token| self.token_kind(token) == kind)
    }

    /// `node` and all its descendant nodes, in preorder.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        (node.0..self.node(node).subtree_end).map(NodeId)
    }

    /// Whether `descendant` is `ancestor` or lies underneath it.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        ancestor.0 <= descendant.0 && descendant.0 < self.node(ancestor).subtree_end
    }

    /// Every token (trivia included) under `node`, in document order.
    pub fn tokens(&self, node: NodeId) -> impl Iterator<Item = TokenId> {
        let data = self.node(node);
        (data.first_token..data.token_end).map(TokenId)
    }

    pub fn first_token(&self, node: NodeId) -> Option<TokenId> {
        self.tokens(node)
            .find(|&token| !self.token_kind(token).is_trivia())
    }

    pub fn last_token(&self, node: NodeId) -> Option<TokenId> {
        let data = self.node(node);
        (data.first_token..data.token_end)
            .rev()
            .map(TokenId)
            .find(|&token| !self.token_kind(token).is_trivia())
    }

    /// Nearest common ancestor of two nodes (either may be the answer).
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        self.ancestors(a).find(|&n| self.is_ancestor_of(n, b))
    }

    // --- Tokens ---

    pub fn token_kind(&self, token: TokenId) -> SyntaxKind {
        self.token(token).kind
    }

    pub fn token_range(&self, token: TokenId) -> TextRange {
        self.token(token).range
    }

    pub fn token_text(&self, token: TokenId) -> &str {
        &self.text[self.token_range(token)]
    }

    pub fn token_parent(&self, token: TokenId) -> NodeId {
        self.token(token).parent
    }

    /// Next non-trivia token after `token`.
    pub fn next_token(&self, token: TokenId) -> Option<TokenId> {
        ((token.0 + 1)..self.tokens.len() as u32)
            .map(TokenId)
            .find(|&t| !self.token_kind(t).is_trivia())
    }

    /// Previous non-trivia token before `token`.
    pub fn prev_token(&self, token: TokenId) -> Option<TokenId> {
        (0..token.0)
            .rev()
            .map(TokenId)
            .find(|&t| !self.token_kind(t).is_trivia())
    }

    /// First non-trivia token that ends after `offset`: the token containing
    /// `offset`, or the next one when `offset` sits in trivia or exactly at a
    /// token boundary.
    pub fn find_token_on_right(&self, offset: TextSize) -> Option<TokenId> {
        let start = self.tokens.partition_point(|token| token.range.end() <= offset);
        (start..self.tokens.len())
            .map(|idx| TokenId(idx as u32))
            .find(|&token| !self.token_kind(token).is_trivia())
    }

    /// Last non-trivia token that starts before `offset`: the token containing
    /// `offset - 1`, or the previous one when that position is trivia.
    pub fn find_token_on_left(&self, offset: TextSize) -> Option<TokenId> {
        let end = self.tokens.partition_point(|token| token.range.start() < offset);
        (0..end)
            .rev()
            .map(|idx| TokenId(idx as u32))
            .find(|&token| !self.token_kind(token).is_trivia())
    }

    /// Nearest node containing both tokens.
    pub fn token_common_ancestor(&self, a: TokenId, b: TokenId) -> Option<NodeId> {
        self.common_ancestor(self.token_parent(a), self.token_parent(b))
    }

    /// Tokens (trivia included) whose range intersects `range`.
    pub fn tokens_in_range(&self, range: TextRange) -> impl Iterator<Item = TokenId> + '_ {
        let start = self.tokens.partition_point(|token| token.range.end() <= range.start());
        let end = self.tokens.partition_point(|token| token.range.start() < range.end());
        (start..end.max(start)).map(|idx| TokenId(idx as u32))
    }

    /// Whether any error token or error node overlaps `range`.
    pub fn contains_errors_in(&self, range: TextRange) -> bool {
        if self
            .tokens_in_range(range)
            .any(|token| self.token_kind(token) == SyntaxKind::Error)
        {
            return true;
        }
        self.nodes.iter().any(|node| {
            node.kind == SyntaxKind::ErrorNode
                && node.range.start() < range.end()
                && range.start() < node.range.end()
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::TreeBuilder;

    // `{ a = b; }` as Block(LBrace ExpressionStatement(Assignment(...)) RBrace)
    fn block_tree() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.start_node(SyntaxKind::Block);
        b.token(SyntaxKind::LBrace, "{");
        b.token(SyntaxKind::Whitespace, " ");
        b.start_node(SyntaxKind::ExpressionStatement);
        b.start_node(SyntaxKind::AssignmentExpression);
        b.start_node(SyntaxKind::NameExpression);
        b.token(SyntaxKind::Identifier, "a");
        b.finish_node();
        b.token(SyntaxKind::Whitespace, " ");
        b.token(SyntaxKind::Eq, "=");
        b.token(SyntaxKind::Whitespace, " ");
        b.start_node(SyntaxKind::NameExpression);
        b.token(SyntaxKind::Identifier, "b");
        b.finish_node();
        b.finish_node();
        b.token(SyntaxKind::Semicolon, ";");
        b.finish_node();
        b.token(SyntaxKind::Whitespace, " ");
        b.token(SyntaxKind::RBrace, "}");
        b.finish_node();
        b.finish().unwrap()
    }

    #[test]
    fn preorder_numbering_and_ranges() {
        let tree = block_tree();
        assert_eq!(tree.text(), "{ a = b; }");
        let kinds: Vec<_> = tree.descendants(tree.root()).map(|n| tree.kind(n)).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Block,
                SyntaxKind::ExpressionStatement,
                SyntaxKind::AssignmentExpression,
                SyntaxKind::NameExpression,
                SyntaxKind::NameExpression,
            ]
        );

        let stmt = NodeId(1);
        assert_eq!(tree.node_span(stmt), TextRange::new(2.into(), 8.into()));
        assert_eq!(tree.parent(stmt), Some(tree.root()));
        assert_eq!(tree.ancestors(NodeId(3)).count(), 4);
        assert!(tree.is_ancestor_of(stmt, NodeId(4)));
        assert!(!tree.is_ancestor_of(NodeId(3), NodeId(4)));
        assert_eq!(tree.common_ancestor(NodeId(3), NodeId(4)), Some(NodeId(2)));
    }

    #[test]
    fn token_lookups_skip_trivia() {
        let tree = block_tree();

        // Inside the whitespace after `{`.
        let right = tree.find_token_on_right(1.into()).unwrap();
        assert_eq!(tree.token_text(right), "a");
        // Exactly at the end of `a`.
        let right = tree.find_token_on_right(3.into()).unwrap();
        assert_eq!(tree.token_text(right), "=");

        let left = tree.find_token_on_left(8.into()).unwrap();
        assert_eq!(tree.token_text(left), ";");
        let left = tree.find_token_on_left(9.into()).unwrap();
        assert_eq!(tree.token_text(left), ";");
        assert_eq!(tree.find_token_on_left(0.into()), None);
        assert_eq!(tree.find_token_on_right(10.into()), None);

        let a = tree.find_token_on_right(2.into()).unwrap();
        assert_eq!(tree.token_text(tree.next_token(a).unwrap()), "=");
        assert_eq!(tree.token_text(tree.prev_token(a).unwrap()), "{");
    }

    #[test]
    fn error_scan_is_range_limited() {
        let mut b = TreeBuilder::new();
        b.start_node(SyntaxKind::Block);
        b.token(SyntaxKind::LBrace, "{");
        b.start_node(SyntaxKind::ErrorNode);
        b.token(SyntaxKind::Error, "@");
        b.finish_node();
        b.token(SyntaxKind::RBrace, "}");
        b.finish_node();
        let tree = b.finish().unwrap();

        assert!(tree.contains_errors_in(TextRange::new(0.into(), 3.into())));
        assert!(!tree.contains_errors_in(TextRange::new(0.into(), 1.into())));
        assert!(!tree.contains_errors_in(TextRange::new(2.into(), 3.into())));
    }
}
