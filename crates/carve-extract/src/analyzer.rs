use carve_core::{Cancelled, TextRange};
use carve_semantic::{DataFlowProvider, SemanticModel};
use serde::Serialize;

use crate::aggregate::{aggregate_status, StatusInputs};
use crate::options::ExtractMethodOptions;
use crate::references::collect_references_with;
use crate::selection::{Selection, SelectionType};
use crate::signature::{infer_signature_with, MethodSignature, RegionFacts};
use crate::status::OperationStatus;
use crate::variables::classify_variables_with;
use crate::ExtractMethodError;

/// The terminal output of one extract-method analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerResult {
    pub selection_type: SelectionType,
    pub final_span: TextRange,
    pub selection_changed: bool,
    #[serde(flatten)]
    pub signature: MethodSignature,
    pub status: OperationStatus,
}

impl AnalyzerResult {
    /// Extraction may proceed (possibly with warnings).
    pub fn succeeded(&self) -> bool {
        self.status.succeeded()
    }
}

/// Runs variable classification, signature inference and status
/// aggregation over an already classified selection.
pub fn analyze(
    selection: &Selection,
    model: &dyn SemanticModel,
    flow: &dyn DataFlowProvider,
    options: &ExtractMethodOptions,
) -> Result<AnalyzerResult, ExtractMethodError> {
    analyze_with(selection, model, flow, options, &mut || Ok(()))
}

pub fn analyze_with(
    selection: &Selection,
    model: &dyn SemanticModel,
    flow: &dyn DataFlowProvider,
    options: &ExtractMethodOptions,
    check_cancelled: &mut dyn FnMut() -> Result<(), Cancelled>,
) -> Result<AnalyzerResult, ExtractMethodError> {
    let _span = tracing::debug_span!(
        "extract_method.analyze",
        span = ?selection.final_span(),
        kind = ?selection.selection_type()
    )
    .entered();

    let tree = selection.tree();
    let region = selection.region();
    check_cancelled()?;
    let data_flow = flow.analyze_data_flow(tree, &region)?;
    let control_flow = flow.analyze_control_flow(tree, &region)?;
    let return_types = model.return_type_facts(tree, &region)?;

    let classification =
        classify_variables_with(selection, model, &data_flow, options, &mut *check_cancelled)?;
    let references = collect_references_with(selection, model, &mut *check_cancelled)?;
    let signature = infer_signature_with(
        RegionFacts {
            selection,
            control_flow: &control_flow,
            return_types: &return_types,
            references: &references,
        },
        &classification,
        model,
        options,
        &mut *check_cancelled,
    )?;
    let status = aggregate_status(
        StatusInputs {
            selection,
            classification: &classification,
            references: &references,
            control_flow: &control_flow,
            signature: &signature,
        },
        options,
    );

    tracing::debug!(
        target: "carve.extract",
        succeeded = status.succeeded(),
        return_type = %signature.return_type,
        "analysis finished"
    );

    Ok(AnalyzerResult {
        selection_type: selection.selection_type(),
        final_span: selection.final_span(),
        selection_changed: selection.selection_changed(),
        signature,
        status,
    })
}
