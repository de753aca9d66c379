use carve_core::TextRange;
use carve_syntax::{NodeId, SyntaxTree};
use carve_types::Type;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{SemanticError, SymbolId};

/// The region a data-flow or control-flow query is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowRegion {
    Expression(NodeId),
    /// A contiguous run of sibling statements, `first..=last`.
    Statements { first: NodeId, last: NodeId },
}

impl FlowRegion {
    /// Span of the region from its first to its last significant token.
    pub fn span(&self, tree: &SyntaxTree) -> Result<TextRange, SemanticError> {
        let (first, last) = match *self {
            FlowRegion::Expression(node) => (node, node),
            FlowRegion::Statements { first, last } => (first, last),
        };
        if !tree.contains_node(first) || !tree.contains_node(last) {
            return Err(SemanticError::RegionOutsideTree);
        }
        let start = tree.node_span(first).start();
        let end = tree.node_span(last).end();
        if end < start {
            return Err(SemanticError::RegionOutOfOrder);
        }
        Ok(TextRange::new(start, end))
    }
}

/// The per-symbol data-flow record: every fact the variable classifier
/// consumes, and nothing it derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowFlags {
    pub captured: bool,
    pub data_flows_in: bool,
    pub data_flows_out: bool,
    pub always_assigned: bool,
    pub declared_inside: bool,
    pub read_inside: bool,
    pub written_inside: bool,
    pub read_outside: bool,
    pub written_outside: bool,
    pub unsafe_address_taken: bool,
}

impl FlowFlags {
    /// Whether the symbol belongs to the candidate set (read, written or
    /// declared inside the region).
    pub fn is_candidate(&self) -> bool {
        self.read_inside || self.written_inside || self.declared_inside
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataFlowFacts {
    symbols: IndexMap<SymbolId, FlowFlags>,
}

impl DataFlowFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: SymbolId, flags: FlowFlags) {
        self.symbols.insert(symbol, flags);
    }

    pub fn get(&self, symbol: SymbolId) -> Option<&FlowFlags> {
        self.symbols.get(&symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &FlowFlags)> + '_ {
        self.symbols.iter().map(|(id, flags)| (*id, flags))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl FromIterator<(SymbolId, FlowFlags)> for DataFlowFacts {
    fn from_iter<I: IntoIterator<Item = (SymbolId, FlowFlags)>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    Return,
    Break,
    Continue,
    Goto,
    Throw,
    Yield,
}

/// A statement inside the region that transfers control out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPoint {
    pub range: TextRange,
    pub kind: ExitKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlowFacts {
    pub start_point_is_reachable: bool,
    pub end_point_is_reachable: bool,
    pub exit_points: Vec<ExitPoint>,
}

impl Default for ControlFlowFacts {
    fn default() -> Self {
        Self {
            start_point_is_reachable: true,
            end_point_is_reachable: true,
            exit_points: Vec::new(),
        }
    }
}

impl ControlFlowFacts {
    pub fn has_exit(&self, kind: ExitKind) -> bool {
        self.exit_points.iter().any(|exit| exit.kind == kind)
    }

    pub fn contains_return(&self) -> bool {
        self.has_exit(ExitKind::Return)
    }
}

/// Typing facts about what a region produces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnTypeFacts {
    /// Natural type of an expression region.
    pub expression_type: Option<Type>,
    /// Type the expression is converted to by its context.
    pub converted_type: Option<Type>,
    /// The expression is a by-ref expression (`ref x`, a ref-returning call).
    pub is_ref_expression: bool,
    /// Declared return type of the member containing the region.
    pub containing_return_type: Option<Type>,
    pub containing_returns_by_ref: bool,
}
