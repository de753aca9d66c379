//! Infers the extracted method's signature from classified variables and
//! the region's return-type facts.

use carve_core::{Cancelled, Name};
use carve_semantic::{ControlFlowFacts, ReturnTypeFacts};
use carve_types::{
    close_over_constraints_with, TupleElement, Type, TypeParamDef, TypeParamEnv, TypeParamRef,
};
use serde::Serialize;

use crate::options::ExtractMethodOptions;
use crate::references::ReferenceFacts;
use crate::selection::Selection;
use crate::variables::{ParameterModifier, VariableClassification, VariableInfo};
use crate::ExtractMethodError;

/// Facts about the selected region, gathered before inference.
#[derive(Debug, Clone, Copy)]
pub struct RegionFacts<'a> {
    pub selection: &'a Selection,
    pub control_flow: &'a ControlFlowFacts,
    pub return_types: &'a ReturnTypeFacts,
    pub references: &'a ReferenceFacts,
}

/// One parameter of the new method, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodParameter {
    pub name: Name,
    pub ty: Type,
    pub modifier: ParameterModifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    /// Method type parameters the declaration must introduce.
    pub type_parameters_in_declaration: Vec<TypeParamDef>,
    /// The subset that needs a constraint clause.
    pub type_parameters_in_constraint_list: Vec<TypeParamDef>,
    /// Classified variables that were not promoted to the return value.
    pub variables: Vec<VariableInfo>,
    pub variables_to_use_as_return_value: Vec<VariableInfo>,
    pub parameters: Vec<MethodParameter>,
    pub return_type: Type,
    /// The return type mentioned an anonymous type, replaced by `object`.
    pub return_type_had_anonymous: bool,
    pub returns_by_ref: bool,
    /// `void` was rewritten to the bare task type.
    pub await_task_return: bool,
    pub instance_member_required: bool,
    pub should_be_read_only: bool,
    pub static_required: bool,
    pub end_of_selection_reachable: bool,
    pub contains_configure_await_false: bool,
}

pub fn infer_signature(
    region: RegionFacts<'_>,
    classification: &VariableClassification,
    env: &dyn TypeParamEnv,
    options: &ExtractMethodOptions,
) -> Result<MethodSignature, ExtractMethodError> {
    infer_signature_with(region, classification, env, options, &mut || Ok(()))
}

pub fn infer_signature_with(
    region: RegionFacts<'_>,
    classification: &VariableClassification,
    env: &dyn TypeParamEnv,
    options: &ExtractMethodOptions,
    check_cancelled: &mut dyn FnMut() -> Result<(), Cancelled>,
) -> Result<MethodSignature, ExtractMethodError> {
    let selection = region.selection;
    let facts = selection.facts();
    let returns = region.return_types;
    let all: Vec<VariableInfo> = classification.variables.values().cloned().collect();

    let (return_type, returns_by_ref, promoted) = if selection.is_expression() {
        let ty = returns
            .expression_type
            .clone()
            .filter(|ty| !ty.is_error())
            .or_else(|| returns.converted_type.clone().filter(|ty| !ty.is_error()))
            .unwrap_or(Type::Object);
        (ty, returns.is_ref_expression, Vec::new())
    } else if region.control_flow.contains_return() {
        let mut ty = returns
            .containing_return_type
            .clone()
            .filter(|ty| !ty.is_error())
            .unwrap_or(Type::Object);
        if facts.scope_is_async {
            ty = ty.unwrap_task();
        }
        (ty, returns.containing_returns_by_ref, Vec::new())
    } else {
        let promoted = select_return_values(
            &all,
            selection.requires_async(),
            classification.return_forced,
            options,
        );
        let ty = match promoted.as_slice() {
            [] => Type::Void,
            [single] => all[*single].ty.clone(),
            many => Type::Tuple(
                many.iter()
                    .map(|&idx| TupleElement::new(all[idx].ty.clone(), all[idx].name.clone()))
                    .collect(),
            ),
        };
        (ty, false, promoted)
    };

    let mut variables = Vec::new();
    let mut to_return = Vec::new();
    for (idx, mut info) in all.into_iter().enumerate() {
        if promoted.contains(&idx) {
            info.use_as_return_value = true;
            to_return.push(info);
        } else {
            variables.push(info);
        }
    }

    let mut return_type = return_type;
    let return_type_had_anonymous = return_type.contains_anonymous();
    if return_type_had_anonymous {
        return_type = return_type.replace_anonymous();
    }
    let mut await_task_return = false;
    if selection.requires_async() {
        await_task_return = return_type.is_void();
        return_type = return_type.wrap_task();
    }

    let parameters = method_parameters(&variables, &to_return);

    let mut roots: Vec<TypeParamRef> = Vec::new();
    for info in variables.iter().chain(&to_return) {
        info.ty.collect_type_params(&mut roots);
    }
    return_type.collect_type_params(&mut roots);
    let type_parameters_in_declaration = close_over_constraints_with(env, &roots, check_cancelled)?;
    let type_parameters_in_constraint_list = type_parameters_in_declaration
        .iter()
        .filter(|def| def.has_constraints())
        .cloned()
        .collect();

    let receiver = &classification.receiver;
    let static_required = facts.scope_is_static || facts.in_primary_constructor_base_type;
    let instance_member_required = receiver.read
        || receiver.written
        || (classification.primary_constructor_parameters_used
            && !facts.in_primary_constructor_base_type)
        || region.references.calls_instance_local_function();
    let should_be_read_only = receiver.read
        && !receiver.written
        && receiver.ty.as_ref().is_some_and(Type::is_mutable_struct);

    tracing::debug!(
        target: "carve.extract",
        %return_type,
        parameters = parameters.len(),
        promoted = to_return.len(),
        returns_by_ref,
        instance_member_required,
        "signature inferred"
    );

    Ok(MethodSignature {
        type_parameters_in_declaration,
        type_parameters_in_constraint_list,
        variables,
        variables_to_use_as_return_value: to_return,
        parameters,
        return_type,
        return_type_had_anonymous,
        returns_by_ref,
        await_task_return,
        instance_member_required,
        should_be_read_only,
        static_required,
        end_of_selection_reachable: region.control_flow.end_point_is_reachable,
        contains_configure_await_false: facts.contains_configure_await_false,
    })
}

/// Indices (into name-ordered `variables`) of the variables that become the
/// return value of a statement extraction.
fn select_return_values(
    variables: &[VariableInfo],
    requires_async: bool,
    return_forced: bool,
    options: &ExtractMethodOptions,
) -> Vec<usize> {
    let with_modifier = |modifier: ParameterModifier| -> Vec<usize> {
        variables
            .iter()
            .enumerate()
            .filter(|(_, info)| info.parameter_modifier() == Some(modifier))
            .map(|(idx, _)| idx)
            .collect()
    };

    let every_output = || -> Vec<usize> {
        variables
            .iter()
            .enumerate()
            .filter(|(_, info)| info.can_be_return_value())
            .map(|(idx, _)| idx)
            .collect()
    };

    if requires_async {
        // Async methods cannot take ref/out parameters: either every output
        // travels in a tuple, or none is promoted and the status reports them.
        if !options.supports_tuple_deconstruction {
            return Vec::new();
        }
        return every_output();
    }
    if return_forced {
        return every_output();
    }

    let outs = with_modifier(ParameterModifier::Out);
    if outs.len() == 1 {
        return outs;
    }
    let refs = with_modifier(ParameterModifier::Ref);
    if refs.len() == 1 && options.promote_single_ref {
        return refs;
    }
    Vec::new()
}

/// Parameter list in name order. A promoted variable whose value flows in
/// is still passed, by value.
fn method_parameters(variables: &[VariableInfo], promoted: &[VariableInfo]) -> Vec<MethodParameter> {
    let mut entries: Vec<(&VariableInfo, ParameterModifier)> = variables
        .iter()
        .filter_map(|info| info.parameter_modifier().map(|modifier| (info, modifier)))
        .chain(
            promoted
                .iter()
                .filter(|info| info.parameter_modifier() == Some(ParameterModifier::Ref))
                .map(|info| (info, ParameterModifier::None)),
        )
        .collect();
    entries.sort_by(|(a, _), (b, _)| {
        a.name
            .cmp(&b.name)
            .then(a.declaration_offset.cmp(&b.declaration_offset))
            .then(a.symbol.cmp(&b.symbol))
    });
    entries
        .into_iter()
        .map(|(info, modifier)| MethodParameter {
            name: info.name.clone(),
            ty: info.ty.clone(),
            modifier,
        })
        .collect()
}
