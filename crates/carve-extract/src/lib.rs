//! Selection analysis and signature inference for "Extract Method".
//!
//! The pipeline has four stages, each usable on its own:
//!
//! 1. [`classify_selection`] validates a text span and produces a
//!    [`Selection`].
//! 2. [`classify_variables`] assigns every symbol touched by the selection a
//!    [`VariableStyle`] from host-supplied data-flow facts.
//! 3. [`infer_signature`] turns the classified variables into a
//!    [`MethodSignature`].
//! 4. [`aggregate_status`] folds every concern into one [`OperationStatus`].
//!
//! [`analyze`] runs stages 2 to 4 over a selection.
//!
//! User-facing outcomes are statuses, never errors. [`ExtractMethodError`] is
//! reserved for broken collaborator contracts and cancellation.

mod aggregate;
mod analyzer;
mod options;
mod references;
mod selection;
mod signature;
mod status;
mod variables;

use carve_core::{Cancelled, Name};
use carve_semantic::{SemanticError, SymbolId};
use carve_types::{TypeError, TypeParamId};
use thiserror::Error;

pub use crate::aggregate::{aggregate_status, StatusInputs};
pub use crate::analyzer::{analyze, analyze_with, AnalyzerResult};
pub use crate::options::{json_schema, ConfigError, ExtractMethodOptions};
pub use crate::references::{
    collect_references, collect_references_with, LocalFunctionCall, ReferenceFacts,
};
pub use crate::selection::{
    classify_selection, classify_selection_with, ExtractScope, ScopeKind, Selection,
    SelectionFacts, SelectionType,
};
pub use crate::signature::{
    infer_signature, infer_signature_with, MethodParameter, MethodSignature, RegionFacts,
};
pub use crate::status::{messages, OperationStatus};
pub use crate::variables::{
    adjust_flags, classify_flags, classify_variables, classify_variables_with,
    DeclarationBehavior, IgnoreReason, ParameterModifier, ReceiverUsage, VariableClassification,
    VariableInfo, VariableStyle,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractMethodError {
    #[error("data-flow facts name symbol {0:?}, which the semantic model does not know")]
    UnknownSymbol(SymbolId),
    #[error("symbol `{name}` ({symbol:?}) has no resolved type")]
    MissingType { symbol: SymbolId, name: Name },
    #[error("type parameter {0:?} has no declaration in the semantic model")]
    UnknownTypeParam(TypeParamId),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error("extract-method analysis was cancelled")]
    Cancelled(#[from] Cancelled),
}

impl From<TypeError> for ExtractMethodError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::UnknownTypeParam(id) => ExtractMethodError::UnknownTypeParam(id),
            TypeError::Cancelled(cancelled) => ExtractMethodError::Cancelled(cancelled),
        }
    }
}
