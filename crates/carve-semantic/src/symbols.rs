use carve_core::{Name, TextRange};
use carve_types::Type;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SymbolKind {
    Local {
        /// Static storage duration (survives across calls).
        #[serde(default)]
        is_static: bool,
    },
    Parameter {
        /// The implicit receiver (`this`).
        #[serde(default)]
        is_this: bool,
        /// A primary-constructor parameter, in scope for the whole type.
        #[serde(default)]
        is_primary_constructor: bool,
        /// Introduced by the compiler (e.g. `value` in a setter).
        #[serde(default)]
        is_synthesized: bool,
    },
    /// A query range variable (`from x in xs`).
    RangeVariable,
    LocalFunction {
        #[serde(default)]
        is_static: bool,
    },
    Field {
        #[serde(default)]
        is_readonly: bool,
    },
}

impl SymbolKind {
    pub fn local() -> Self {
        SymbolKind::Local { is_static: false }
    }

    pub fn parameter() -> Self {
        SymbolKind::Parameter {
            is_this: false,
            is_primary_constructor: false,
            is_synthesized: false,
        }
    }

    pub fn this() -> Self {
        SymbolKind::Parameter {
            is_this: true,
            is_primary_constructor: false,
            is_synthesized: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: Name,
    pub kind: SymbolKind,
    /// Resolved type. `None` only for symbols the host could not type, which
    /// the variable classifier treats as a contract violation.
    pub ty: Option<Type>,
    /// Span of the declaring identifier, when the symbol is declared in
    /// source.
    pub declaration: Option<TextRange>,
}

impl Symbol {
    pub fn is_this(&self) -> bool {
        matches!(self.kind, SymbolKind::Parameter { is_this: true, .. })
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind, SymbolKind::Parameter { .. })
    }

    pub fn is_primary_constructor_parameter(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Parameter {
                is_primary_constructor: true,
                ..
            }
        )
    }

    pub fn is_synthesized_parameter(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Parameter {
                is_synthesized: true,
                ..
            }
        )
    }

    pub fn is_static_local(&self) -> bool {
        matches!(self.kind, SymbolKind::Local { is_static: true })
    }

    pub fn is_readonly_field(&self) -> bool {
        matches!(self.kind, SymbolKind::Field { is_readonly: true })
    }

    /// Whether the symbol is declared somewhere inside `range`.
    pub fn is_declared_in(&self, range: TextRange) -> bool {
        self.declaration
            .is_some_and(|decl| carve_core::range_contains_range(range, decl))
    }
}

/// One identifier occurrence resolving to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolReference {
    pub symbol: SymbolId,
    pub range: TextRange,
    /// Assignment target (including compound assignment and `++`/`--`).
    #[serde(default)]
    pub is_written: bool,
}

/// Flow state of a nullable reference at a program point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    #[default]
    Unknown,
    MaybeNull,
    NotNull,
}
