//! Semantic facts consumed by extract-method analysis.
//!
//! Everything here is produced by the host's compiler front-end. The analysis
//! engine never re-derives these facts: it only asks for them through
//! [`SemanticModel`] and [`DataFlowProvider`].

mod flow;
mod snapshot;
mod symbols;

use carve_core::TextRange;
use carve_syntax::SyntaxTree;
use carve_types::TypeParamEnv;
use thiserror::Error;

pub use crate::flow::{
    ControlFlowFacts, DataFlowFacts, ExitKind, ExitPoint, FlowFlags, FlowRegion, ReturnTypeFacts,
};
pub use crate::snapshot::SemanticSnapshot;
pub use crate::symbols::{Nullability, Symbol, SymbolId, SymbolKind, SymbolReference};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("flow region references nodes outside the syntax tree")]
    RegionOutsideTree,
    #[error("flow region ends before it starts")]
    RegionOutOfOrder,
    #[error("no {what} facts available for region {range:?}")]
    MissingFacts { what: &'static str, range: TextRange },
}

/// Symbol, type and typing queries.
pub trait SemanticModel: TypeParamEnv {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// Every identifier inside `range` that resolves to a symbol, in
    /// document order.
    fn referenced_symbols(&self, range: TextRange) -> Vec<SymbolReference>;

    /// Flow state of `symbol` throughout `range`.
    fn flow_nullability(&self, symbol: SymbolId, range: TextRange) -> Nullability;

    fn return_type_facts(
        &self,
        tree: &SyntaxTree,
        region: &FlowRegion,
    ) -> Result<ReturnTypeFacts, SemanticError>;
}

/// Data-flow and control-flow analysis over a region.
pub trait DataFlowProvider {
    fn analyze_data_flow(
        &self,
        tree: &SyntaxTree,
        region: &FlowRegion,
    ) -> Result<DataFlowFacts, SemanticError>;

    fn analyze_control_flow(
        &self,
        tree: &SyntaxTree,
        region: &FlowRegion,
    ) -> Result<ControlFlowFacts, SemanticError>;
}
