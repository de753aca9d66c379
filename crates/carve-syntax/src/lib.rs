//! Syntax tree model for Carve.
//!
//! Carve does not parse source text. Hosts (and the test fixtures) feed an
//! already-parsed tree through [`TreeBuilder`]; the analysis only needs
//! position lookups, explicit ancestor/descendant traversal, and node kind
//! predicates.

mod builder;
mod syntax_kind;
mod tree;

use thiserror::Error;

pub use crate::builder::TreeBuilder;
pub use crate::syntax_kind::SyntaxKind;
pub use crate::tree::{NodeId, SyntaxElement, SyntaxTree, TokenId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("tree has no root node")]
    Empty,
    #[error("tree has more than one root node")]
    MultipleRoots,
    #[error("node `{0:?}` was never finished")]
    UnclosedNode(SyntaxKind),
    #[error("`finish_node` called without a matching `start_node`")]
    UnmatchedFinish,
    #[error("token emitted outside of any node")]
    TokenOutsideNode,
    #[error("`{0:?}` is a token kind, not a node kind")]
    NotANodeKind(SyntaxKind),
    #[error("`{0:?}` is a node kind, not a token kind")]
    NotATokenKind(SyntaxKind),
}
