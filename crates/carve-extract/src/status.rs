use std::fmt;

use serde::Serialize;

/// Outcome of a validity check.
///
/// `succeeded == false` blocks the refactoring. A succeeded status that still
/// carries reasons is a warning the user must see, but extraction proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationStatus {
    succeeded: bool,
    reasons: Vec<String>,
}

impl Default for OperationStatus {
    fn default() -> Self {
        Self::ok()
    }
}

impl OperationStatus {
    pub const fn ok() -> Self {
        Self {
            succeeded: true,
            reasons: Vec::new(),
        }
    }

    pub fn new(succeeded: bool, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            succeeded,
            reasons: if reason.is_empty() {
                Vec::new()
            } else {
                vec![reason]
            },
        }
    }

    /// A blocking failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::new(false, reason)
    }

    /// A non-blocking warning.
    pub fn warning(reason: impl Into<String>) -> Self {
        Self::new(true, reason)
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn failed_hard(&self) -> bool {
        !self.succeeded
    }

    pub fn has_reasons(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// All reasons joined with newlines, or `None` for a clean status.
    pub fn message(&self) -> Option<String> {
        if self.reasons.is_empty() {
            None
        } else {
            Some(self.reasons.join("\n"))
        }
    }

    /// Combines two statuses: succeeded only if both did, reasons in order.
    #[must_use]
    pub fn with(mut self, other: OperationStatus) -> Self {
        self.succeeded &= other.succeeded;
        self.reasons.extend(other.reasons);
        self
    }

    /// `self.with(OperationStatus::new(succeeded, reason))`.
    #[must_use]
    pub fn with_reason(self, succeeded: bool, reason: impl Into<String>) -> Self {
        self.with(OperationStatus::new(succeeded, reason))
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.succeeded { "ok" } else { "failed" };
        match self.message() {
            Some(message) => write!(f, "{verdict}: {message}"),
            None => f.write_str(verdict),
        }
    }
}

/// User-facing reasons, surfaced verbatim.
pub mod messages {
    use std::fmt::Display;

    pub const INVALID_SELECTION: &str = "Invalid selection.";
    pub const NO_VALID_TOKEN: &str = "Selection does not contain a valid token.";
    pub const NO_VALID_SELECTION: &str = "No valid selection to perform extraction.";
    pub const NO_COMMON_ROOT: &str = "No common root node for extraction.";
    pub const NOT_IN_TYPE: &str = "Selection not contained inside a type.";
    pub const CONSTANT_INITIALIZER: &str =
        "Selection can not be part of constant initializer expression.";
    pub const REF_OR_OUT_ARGUMENT: &str =
        "Argument used for ref or out parameter can't be extracted out.";
    pub const NO_VALID_STATEMENT_RANGE: &str = "No valid statement range to extract.";
    pub const SYNTAX_ERRORS: &str = "The selection contains syntactic errors.";
    pub const CROSSES_DIRECTIVES: &str = "Selection can not cross over preprocessor directives.";
    pub const CONTAINS_YIELD: &str = "Selection can not contain a yield statement.";
    pub const LOOP_WIDENED: &str = "The selection was expanded to include the whole loop.";
    pub const CANCELLED: &str = "The operation was cancelled.";
    pub const UNSAFE_ADDRESS_TAKEN: &str =
        "The address of a variable is used inside the selected code.";
    pub const LOCAL_FUNCTION_CALL: &str =
        "The selection contains a local function call without its declaration.";
    pub const NOT_ALL_PATHS_RETURN: &str =
        "Not all code paths return a value in the selected code.";

    fn bracketed<T: Display>(items: &[T]) -> String {
        let joined = items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{joined}]")
    }

    pub fn readonly_fields_written<T: Display>(fields: &[T]) -> String {
        format!(
            "Assigning to readonly fields must be done in a constructor: {}.",
            bracketed(fields)
        )
    }

    pub fn anonymous_types<T: Display>(names: &[T]) -> String {
        format!(
            "Parameters' type or return type cannot be an anonymous type: {}.",
            bracketed(names)
        )
    }

    pub fn async_ref_out<T: Display>(names: &[T]) -> String {
        format!(
            "Asynchronous method cannot have ref/out parameters: {}.",
            bracketed(names)
        )
    }

    pub fn unresolved<T: Display>(names: &[T]) -> String {
        let joined = names
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("Failed to analyze data-flow for: {joined}")
    }

    pub fn jump_out_of_selection(keyword: &str) -> String {
        format!("Selection can not contain a '{keyword}' that jumps outside of it.")
    }
}
