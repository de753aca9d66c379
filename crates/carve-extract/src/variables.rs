//! Decides how every symbol touched by a selection crosses the boundary of
//! the extracted method.

use carve_core::{Cancelled, Name, TextRange, TextSize};
use carve_semantic::{
    DataFlowFacts, FlowFlags, Nullability, SemanticModel, Symbol, SymbolId, SymbolKind,
};
use carve_types::Type;
use indexmap::IndexMap;
use serde::Serialize;

use crate::options::ExtractMethodOptions;
use crate::selection::Selection;
use crate::ExtractMethodError;

/// How a variable crosses into and out of the extracted method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableStyle {
    /// Not part of the signature.
    None,
    /// Passed by value.
    InputOnly,
    /// Needed before and after the selection: passed by reference.
    Ref,
    /// Only produced by the selection.
    Out,
    /// The declaration moves into the new method; the caller never sees it.
    MoveIn,
    /// Flows in and is reassigned, but the new value is never observed.
    SplitIn,
    /// Declared inside and observed after the selection without flowing out.
    SplitOut,
    /// An output whose declaration also moves out of the selection.
    OutWithMoveOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterModifier {
    None,
    Ref,
    Out,
}

/// What the code generator has to do with the variable's declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationBehavior {
    None,
    MoveIn,
    SplitIn,
    SplitOut,
    MoveOut,
}

impl VariableStyle {
    /// Escalation used when the new method cannot take `ref`/`out`
    /// parameters and outputs have to be returned instead.
    pub fn always_return(self) -> VariableStyle {
        match self {
            VariableStyle::InputOnly => VariableStyle::Ref,
            VariableStyle::MoveIn | VariableStyle::SplitIn => VariableStyle::Out,
            VariableStyle::SplitOut => VariableStyle::OutWithMoveOut,
            other => other,
        }
    }

    /// Modifier of the parameter, or `None` if the variable is not a
    /// parameter at all.
    pub fn parameter_modifier(self) -> Option<ParameterModifier> {
        match self {
            VariableStyle::InputOnly => Some(ParameterModifier::None),
            VariableStyle::Ref => Some(ParameterModifier::Ref),
            VariableStyle::Out | VariableStyle::SplitOut | VariableStyle::OutWithMoveOut => {
                Some(ParameterModifier::Out)
            }
            VariableStyle::None | VariableStyle::MoveIn | VariableStyle::SplitIn => None,
        }
    }

    pub fn declaration_behavior(self) -> DeclarationBehavior {
        match self {
            VariableStyle::MoveIn => DeclarationBehavior::MoveIn,
            VariableStyle::SplitIn => DeclarationBehavior::SplitIn,
            VariableStyle::SplitOut => DeclarationBehavior::SplitOut,
            VariableStyle::OutWithMoveOut => DeclarationBehavior::MoveOut,
            VariableStyle::None
            | VariableStyle::InputOnly
            | VariableStyle::Ref
            | VariableStyle::Out => DeclarationBehavior::None,
        }
    }

    /// `ref` and `out` parameters can be turned into the return value.
    pub fn can_be_return_value(self) -> bool {
        matches!(
            self.parameter_modifier(),
            Some(ParameterModifier::Ref | ParameterModifier::Out)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableInfo {
    pub symbol: SymbolId,
    pub name: Name,
    /// Type as it should appear in the signature.
    pub ty: Type,
    pub style: VariableStyle,
    /// Set by signature inference when the variable becomes (part of) the
    /// return value.
    pub use_as_return_value: bool,
    /// The original type mentioned an anonymous type, replaced by `object`.
    pub had_anonymous_type: bool,
    #[serde(skip)]
    pub declaration_offset: Option<TextSize>,
}

impl VariableInfo {
    pub fn parameter_modifier(&self) -> Option<ParameterModifier> {
        self.style.parameter_modifier()
    }

    pub fn declaration_behavior(&self) -> DeclarationBehavior {
        self.style.declaration_behavior()
    }

    pub fn is_parameter(&self) -> bool {
        self.parameter_modifier().is_some()
    }

    pub fn can_be_return_value(&self) -> bool {
        self.style.can_be_return_value()
    }
}

/// Why a candidate symbol was left out of the variable map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    Receiver,
    SynthesizedParameter,
    /// Already in scope for every member of the type.
    PrimaryConstructorParameter,
    /// A lambda or local function parameter declared inside the selection.
    DeclaredInsideParameter,
    EmptyName,
    /// Declared inside and never observed outside.
    LocalToSelection,
    /// Fields and local functions are not data-flow variables.
    NotAVariable,
}

/// How the implicit receiver is used inside the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverUsage {
    pub read: bool,
    pub written: bool,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableClassification {
    /// Classified variables ordered by name, then declaration position.
    pub variables: IndexMap<SymbolId, VariableInfo>,
    /// Symbols no rule matched. Always empty in best-effort mode.
    pub unresolved: Vec<(SymbolId, Name)>,
    pub ignored: IndexMap<SymbolId, IgnoreReason>,
    pub unsafe_address_taken_used: bool,
    /// Some variable written inside was escalated with
    /// [`VariableStyle::always_return`], so every output has to be returned.
    pub return_forced: bool,
    pub receiver: ReceiverUsage,
    /// A primary-constructor parameter is read or written, so the method
    /// needs the instance.
    pub primary_constructor_parameters_used: bool,
}

impl VariableClassification {
    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Repairs known corner cases of raw flow facts before classification.
pub fn adjust_flags(mut flags: FlowFlags, is_static_local: bool) -> FlowFlags {
    if is_static_local && flags.declared_inside {
        flags.data_flows_in = false;
    }
    if flags.data_flows_out {
        flags.read_outside = true;
    }
    if flags.declared_inside
        && flags.written_inside
        && flags.read_outside
        && !flags.written_outside
    {
        flags.data_flows_out = true;
    }
    flags
}

/// The decision table from adjusted flags to a style. `None` means no rule
/// applies and the symbol is unresolved.
///
/// `captured` and `unsafe_address_taken` do not take part; they drive
/// post-processing and status only.
pub fn classify_flags(flags: &FlowFlags) -> Option<VariableStyle> {
    let FlowFlags {
        data_flows_in,
        data_flows_out,
        always_assigned,
        declared_inside,
        read_inside,
        written_inside,
        read_outside,
        written_outside,
        ..
    } = *flags;

    if declared_inside {
        return if data_flows_out && !written_inside {
            None
        } else if data_flows_out {
            Some(VariableStyle::OutWithMoveOut)
        } else if read_outside || written_outside {
            Some(VariableStyle::SplitOut)
        } else {
            Some(VariableStyle::None)
        };
    }

    if !written_inside {
        return read_inside.then_some(VariableStyle::InputOnly);
    }
    Some(if data_flows_in && data_flows_out {
        VariableStyle::Ref
    } else if data_flows_in {
        VariableStyle::SplitIn
    } else if data_flows_out || read_outside {
        if always_assigned {
            VariableStyle::Out
        } else {
            VariableStyle::Ref
        }
    } else {
        VariableStyle::MoveIn
    })
}

/// Overrides applied on top of the decision table, in this order:
///
/// 1. a captured `MoveIn` becomes `Out`, since the declaration cannot move
///    into a closure;
/// 2. a value type never written inside is passed by value, whatever the
///    table said;
/// 3. a forced return escalates written variables with
///    [`VariableStyle::always_return`].
pub fn override_style(
    style: Option<VariableStyle>,
    flags: &FlowFlags,
    is_value_type: bool,
    forced_return: bool,
) -> Option<VariableStyle> {
    let mut style = style;
    if flags.captured && style == Some(VariableStyle::MoveIn) {
        style = Some(VariableStyle::Out);
    }
    if is_value_type && !flags.written_inside {
        style = Some(VariableStyle::InputOnly);
    }
    if forced_return && flags.written_inside {
        style = style.map(VariableStyle::always_return);
    }
    style
}

/// Declared inside and invisible after the selection.
fn is_local_to_selection(flags: &FlowFlags) -> bool {
    flags.declared_inside && !flags.data_flows_out && !flags.read_outside && !flags.written_outside
}

pub fn classify_variables(
    selection: &Selection,
    model: &dyn SemanticModel,
    facts: &DataFlowFacts,
    options: &ExtractMethodOptions,
) -> Result<VariableClassification, ExtractMethodError> {
    classify_variables_with(selection, model, facts, options, &mut || Ok(()))
}

pub fn classify_variables_with(
    selection: &Selection,
    model: &dyn SemanticModel,
    facts: &DataFlowFacts,
    options: &ExtractMethodOptions,
    check_cancelled: &mut dyn FnMut() -> Result<(), Cancelled>,
) -> Result<VariableClassification, ExtractMethodError> {
    let span = selection.final_span();
    let in_base_type = selection.facts().in_primary_constructor_base_type;
    let forced_return_for_async = selection.requires_async() && options.supports_tuple_deconstruction;

    let mut out = VariableClassification::default();
    let mut variables: Vec<VariableInfo> = Vec::new();

    for (id, raw) in facts.iter() {
        check_cancelled()?;
        if !raw.is_candidate() {
            continue;
        }
        let symbol = model
            .symbol(id)
            .ok_or(ExtractMethodError::UnknownSymbol(id))?;

        if symbol.is_this() {
            out.receiver.read |= raw.read_inside;
            out.receiver.written |= raw.written_inside;
            if out.receiver.ty.is_none() {
                out.receiver.ty = symbol.ty.clone();
            }
            out.ignored.insert(id, IgnoreReason::Receiver);
            continue;
        }
        if let Some(reason) = ignore_reason(symbol, span, in_base_type) {
            if reason == IgnoreReason::PrimaryConstructorParameter {
                out.primary_constructor_parameters_used |= raw.read_inside || raw.written_inside;
            }
            tracing::trace!(target: "carve.extract", name = %symbol.name, ?reason, "ignored");
            out.ignored.insert(id, reason);
            continue;
        }

        let flags = adjust_flags(*raw, symbol.is_static_local());
        if is_local_to_selection(&flags) {
            tracing::trace!(target: "carve.extract", name = %symbol.name, "local to selection");
            out.ignored.insert(id, IgnoreReason::LocalToSelection);
            continue;
        }

        let ty = symbol.ty.clone().ok_or_else(|| ExtractMethodError::MissingType {
            symbol: id,
            name: symbol.name.clone(),
        })?;

        let forced_return = forced_return_for_async
            || (options.prefer_return_for_structs && ty.is_user_defined_struct());
        let style = override_style(
            classify_flags(&flags),
            &flags,
            ty.is_value_type(),
            forced_return,
        );

        let style = match style {
            Some(style) => style,
            None if options.best_effort => {
                tracing::warn!(
                    target: "carve.extract",
                    name = %symbol.name,
                    ?flags,
                    "no classification rule matched; degrading to none"
                );
                VariableStyle::None
            }
            None => {
                tracing::debug!(target: "carve.extract", name = %symbol.name, ?flags, "unresolved");
                out.unresolved.push((id, symbol.name.clone()));
                continue;
            }
        };

        let mut ty = ty;
        if ty.is_annotated_reference() && model.flow_nullability(id, span) == Nullability::NotNull {
            ty = ty.without_nullable_annotation();
        }
        let had_anonymous_type = ty.contains_anonymous();
        if had_anonymous_type {
            ty = ty.replace_anonymous();
        }

        out.return_forced |= forced_return && flags.written_inside;
        out.unsafe_address_taken_used |= flags.unsafe_address_taken;
        tracing::trace!(target: "carve.extract", name = %symbol.name, ?style, %ty, "classified");
        variables.push(VariableInfo {
            symbol: id,
            name: symbol.name.clone(),
            ty,
            style,
            use_as_return_value: false,
            had_anonymous_type,
            declaration_offset: symbol.declaration.map(|decl| decl.start()),
        });
    }

    variables.sort_by(|a, b| {
        a.name
            .as_str()
            .cmp(b.name.as_str())
            .then(a.declaration_offset.cmp(&b.declaration_offset))
            .then(a.symbol.cmp(&b.symbol))
    });
    out.variables = variables
        .into_iter()
        .map(|info| (info.symbol, info))
        .collect();

    tracing::debug!(
        target: "carve.extract",
        variables = out.variables.len(),
        unresolved = out.unresolved.len(),
        ignored = out.ignored.len(),
        "variables classified"
    );
    Ok(out)
}

fn ignore_reason(symbol: &Symbol, span: TextRange, in_base_type: bool) -> Option<IgnoreReason> {
    if matches!(
        symbol.kind,
        SymbolKind::Field { .. } | SymbolKind::LocalFunction { .. }
    ) {
        Some(IgnoreReason::NotAVariable)
    } else if symbol.is_synthesized_parameter() {
        Some(IgnoreReason::SynthesizedParameter)
    } else if symbol.is_primary_constructor_parameter() && !in_base_type {
        Some(IgnoreReason::PrimaryConstructorParameter)
    } else if symbol.is_parameter() && symbol.is_declared_in(span) {
        Some(IgnoreReason::DeclaredInsideParameter)
    } else if symbol.name.is_empty() {
        Some(IgnoreReason::EmptyName)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use carve_test_utils::flow;
    use pretty_assertions::assert_eq;

    use super::*;

    fn style(words: &str) -> Option<VariableStyle> {
        classify_flags(&adjust_flags(flow(words), false))
    }

    #[test]
    fn always_return_escalates_only_movable_styles() {
        use VariableStyle::*;
        let pairs = [
            (None, None),
            (InputOnly, Ref),
            (Ref, Ref),
            (Out, Out),
            (MoveIn, Out),
            (SplitIn, Out),
            (SplitOut, OutWithMoveOut),
            (OutWithMoveOut, OutWithMoveOut),
        ];
        for (from, to) in pairs {
            assert_eq!(from.always_return(), to, "{from:?}");
        }
    }

    #[test]
    fn flag_adjustments() {
        let flags = adjust_flags(flow("decl in wi"), true);
        assert!(!flags.data_flows_in);
        let flags = adjust_flags(flow("decl in wi"), false);
        assert!(flags.data_flows_in);

        assert!(adjust_flags(flow("out"), false).read_outside);

        let flags = adjust_flags(flow("decl wi ro"), false);
        assert!(flags.data_flows_out);
        let flags = adjust_flags(flow("decl wi ro wo"), false);
        assert!(!flags.data_flows_out);
    }

    #[test]
    fn decision_table_rows() {
        assert_eq!(style("ri"), Some(VariableStyle::InputOnly));
        assert_eq!(style("in out ri wi"), Some(VariableStyle::Ref));
        assert_eq!(style("in ri wi"), Some(VariableStyle::SplitIn));
        assert_eq!(style("wi ro always"), Some(VariableStyle::Out));
        assert_eq!(style("wi ro"), Some(VariableStyle::Ref));
        assert_eq!(style("wi"), Some(VariableStyle::MoveIn));
        assert_eq!(style("decl wi ro"), Some(VariableStyle::OutWithMoveOut));
        assert_eq!(style("decl wi wo"), Some(VariableStyle::SplitOut));
        assert_eq!(style("decl out"), None);
        assert_eq!(style("wo"), None);
    }

    #[test]
    fn value_types_read_only_inside_are_passed_by_value() {
        let overridden = |words: &str, is_value_type: bool| {
            let flags = adjust_flags(flow(words), false);
            override_style(classify_flags(&flags), &flags, is_value_type, false)
        };
        assert_eq!(overridden("decl out ro", true), Some(VariableStyle::InputOnly));
        assert_eq!(overridden("decl out ro", false), None);
        assert_eq!(overridden("decl ro", true), Some(VariableStyle::InputOnly));
        assert_eq!(overridden("decl ro", false), Some(VariableStyle::SplitOut));
        assert_eq!(overridden("in out ri wi ro", true), Some(VariableStyle::Ref));
    }

    #[test]
    fn captured_move_in_and_forced_return() {
        let flags = adjust_flags(flow("captured wi"), false);
        assert_eq!(
            override_style(classify_flags(&flags), &flags, false, false),
            Some(VariableStyle::Out)
        );
        let flags = adjust_flags(flow("decl wi wo"), false);
        assert_eq!(
            override_style(classify_flags(&flags), &flags, true, true),
            Some(VariableStyle::OutWithMoveOut)
        );
    }

    #[test]
    fn modifiers_and_declarations() {
        assert_eq!(
            VariableStyle::SplitOut.parameter_modifier(),
            Some(ParameterModifier::Out)
        );
        assert_eq!(VariableStyle::MoveIn.parameter_modifier(), None);
        assert_eq!(
            VariableStyle::OutWithMoveOut.declaration_behavior(),
            DeclarationBehavior::MoveOut
        );
        assert!(VariableStyle::Ref.can_be_return_value());
        assert!(!VariableStyle::InputOnly.can_be_return_value());
    }
}
