//! Symbol references inside the selection that are not data-flow variables:
//! local function calls and readonly field writes.

use carve_core::{Cancelled, Name, TextRange};
use carve_semantic::{SemanticModel, SymbolId, SymbolKind};
use indexmap::IndexMap;
use serde::Serialize;

use crate::selection::Selection;
use crate::ExtractMethodError;

/// A call to a local function declared outside the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalFunctionCall {
    pub symbol: SymbolId,
    pub name: Name,
    pub is_static: bool,
    /// First reference inside the selection.
    pub range: TextRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceFacts {
    pub outer_local_function_calls: Vec<LocalFunctionCall>,
    pub readonly_field_writes: Vec<Name>,
}

impl ReferenceFacts {
    /// An outer local function that captures the instance.
    pub fn calls_instance_local_function(&self) -> bool {
        self.outer_local_function_calls
            .iter()
            .any(|call| !call.is_static)
    }
}

pub fn collect_references(
    selection: &Selection,
    model: &dyn SemanticModel,
) -> Result<ReferenceFacts, ExtractMethodError> {
    collect_references_with(selection, model, &mut || Ok(()))
}

pub fn collect_references_with(
    selection: &Selection,
    model: &dyn SemanticModel,
    check_cancelled: &mut dyn FnMut() -> Result<(), Cancelled>,
) -> Result<ReferenceFacts, ExtractMethodError> {
    let span = selection.final_span();
    let mut calls: IndexMap<SymbolId, LocalFunctionCall> = IndexMap::new();
    let mut fields: Vec<Name> = Vec::new();

    for reference in model.referenced_symbols(span) {
        check_cancelled()?;
        let symbol = model
            .symbol(reference.symbol)
            .ok_or(ExtractMethodError::UnknownSymbol(reference.symbol))?;
        match symbol.kind {
            SymbolKind::LocalFunction { is_static } if !symbol.is_declared_in(span) => {
                calls
                    .entry(symbol.id)
                    .or_insert_with(|| LocalFunctionCall {
                        symbol: symbol.id,
                        name: symbol.name.clone(),
                        is_static,
                        range: reference.range,
                    });
            }
            SymbolKind::Field { is_readonly: true } if reference.is_written => {
                if !fields.contains(&symbol.name) {
                    fields.push(symbol.name.clone());
                }
            }
            _ => {}
        }
    }

    Ok(ReferenceFacts {
        outer_local_function_calls: calls.into_values().collect(),
        readonly_field_writes: fields,
    })
}
