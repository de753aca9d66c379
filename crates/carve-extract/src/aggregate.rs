//! Folds every validity concern of one analysis into a single status.

use carve_semantic::{ControlFlowFacts, ExitKind};

use crate::options::ExtractMethodOptions;
use crate::references::ReferenceFacts;
use crate::selection::Selection;
use crate::signature::MethodSignature;
use crate::status::{messages, OperationStatus};
use crate::variables::{ParameterModifier, VariableClassification};

/// Everything the aggregator looks at.
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs<'a> {
    pub selection: &'a Selection,
    pub classification: &'a VariableClassification,
    pub references: &'a ReferenceFacts,
    pub control_flow: &'a ControlFlowFacts,
    pub signature: &'a MethodSignature,
}

/// Combines the checks in a fixed order. Soft checks append a warning, hard
/// checks flip `succeeded`; all reasons are kept.
pub fn aggregate_status(inputs: StatusInputs<'_>, options: &ExtractMethodOptions) -> OperationStatus {
    let StatusInputs {
        selection,
        classification,
        references,
        control_flow,
        signature,
    } = inputs;

    let mut status = selection.status().clone();

    if selection.facts().in_constructor && !references.readonly_field_writes.is_empty() {
        status = status.with(OperationStatus::warning(messages::readonly_fields_written(
            &references.readonly_field_writes,
        )));
    }

    let mut anonymous: Vec<String> = signature
        .variables
        .iter()
        .chain(&signature.variables_to_use_as_return_value)
        .filter(|info| info.had_anonymous_type)
        .map(|info| info.name.to_string())
        .collect();
    if signature.return_type_had_anonymous && anonymous.is_empty() {
        anonymous.push(signature.return_type.to_string());
    }
    if !anonymous.is_empty() {
        status = status.with(OperationStatus::warning(messages::anonymous_types(&anonymous)));
    }

    if classification.unsafe_address_taken_used {
        status = status.with(OperationStatus::warning(messages::UNSAFE_ADDRESS_TAKEN));
    }

    if selection.requires_async() {
        let by_ref: Vec<&str> = signature
            .parameters
            .iter()
            .filter(|param| param.modifier != ParameterModifier::None)
            .map(|param| param.name.as_str())
            .collect();
        if !by_ref.is_empty() {
            status = status.with(OperationStatus::failed(messages::async_ref_out(&by_ref)));
        }
    }

    if !classification.unresolved.is_empty() {
        let names: Vec<&str> = classification
            .unresolved
            .iter()
            .map(|(_, name)| name.as_str())
            .collect();
        status = status.with(OperationStatus::warning(messages::unresolved(&names)));
    }

    if !options.extract_local_function && !references.outer_local_function_calls.is_empty() {
        status = status.with(OperationStatus::failed(messages::LOCAL_FUNCTION_CALL));
    }

    for (kind, keyword) in [
        (ExitKind::Break, "break"),
        (ExitKind::Continue, "continue"),
        (ExitKind::Goto, "goto"),
    ] {
        if control_flow.has_exit(kind) {
            status = status.with(OperationStatus::failed(messages::jump_out_of_selection(
                keyword,
            )));
        }
    }

    let returns_value = !signature.return_type.clone().unwrap_task().is_void();
    if !selection.is_expression()
        && control_flow.contains_return()
        && control_flow.end_point_is_reachable
        && returns_value
    {
        status = status.with(OperationStatus::warning(messages::NOT_ALL_PATHS_RETURN));
    }

    tracing::debug!(target: "carve.extract", %status, "status aggregated");
    status
}
