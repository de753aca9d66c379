use std::sync::Arc;

use carve_core::{DocumentVersion, TextRange, TextSize};

use crate::tree::{NodeData, TokenData};
use crate::{NodeId, SyntaxElement, SyntaxKind, SyntaxTree, TokenId, TreeError};

/// Incremental builder for [`SyntaxTree`], modelled on rowan's
/// `GreenNodeBuilder`: callers emit `start_node` / `token` / `finish_node`
/// events in document order and the builder assembles the source text from
/// the token texts.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    text: String,
    version: DocumentVersion,
    nodes: Vec<NodeData>,
    tokens: Vec<TokenData>,
    stack: Vec<(NodeId, TextSize)>,
    error: Option<TreeError>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(version: DocumentVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    fn offset(&self) -> TextSize {
        TextSize::of(self.text.as_str())
    }

    fn fail(&mut self, error: TreeError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn start_node(&mut self, kind: SyntaxKind) {
        if !kind.is_node() {
            self.fail(TreeError::NotANodeKind(kind));
            return;
        }

        let parent = self.stack.last().map(|(id, _)| *id);
        if parent.is_none() && !self.nodes.is_empty() {
            self.fail(TreeError::MultipleRoots);
            return;
        }

        let id = NodeId(self.nodes.len() as u32);
        let start = self.offset();
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            range: TextRange::empty(start),
            subtree_end: id.0 + 1,
            first_token: self.tokens.len() as u32,
            token_end: self.tokens.len() as u32,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()]
                .children
                .push(SyntaxElement::Node(id));
        }
        self.stack.push((id, start));
    }

    pub fn token(&mut self, kind: SyntaxKind, text: &str) {
        if !kind.is_token() {
            self.fail(TreeError::NotATokenKind(kind));
            return;
        }
        let Some(&(parent, _)) = self.stack.last() else {
            self.fail(TreeError::TokenOutsideNode);
            return;
        };

        let start = self.offset();
        self.text.push_str(text);
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(TokenData {
            kind,
            range: TextRange::new(start, self.offset()),
            parent,
        });
        self.nodes[parent.index()]
            .children
            .push(SyntaxElement::Token(id));
    }

    pub fn finish_node(&mut self) {
        let Some((id, start)) = self.stack.pop() else {
            self.fail(TreeError::UnmatchedFinish);
            return;
        };
        let end = self.offset();
        let subtree_end = self.nodes.len() as u32;
        let token_end = self.tokens.len() as u32;
        let node = &mut self.nodes[id.index()];
        node.range = TextRange::new(start, end);
        node.subtree_end = subtree_end;
        node.token_end = token_end;
    }

    pub fn finish(self) -> Result<SyntaxTree, TreeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(&(open, _)) = self.stack.last() {
            return Err(TreeError::UnclosedNode(self.nodes[open.index()].kind));
        }
        if self.nodes.is_empty() {
            return Err(TreeError::Empty);
        }

        Ok(SyntaxTree::from_parts(
            Arc::from(self.text),
            self.version,
            self.nodes,
            self.tokens,
        ))
    }
}
