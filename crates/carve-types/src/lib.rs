//! Symbol types as consumed by extract-method analysis.
//!
//! Carve never infers types itself. The host's semantic model hands us
//! already-resolved [`Type`] values; this crate only answers the handful of
//! structural questions signature inference needs (is it a value type, does it
//! leak an anonymous type, which method type parameters does it mention, how
//! does it look wrapped in an asynchronous task).

mod type_params;

use std::fmt;

use carve_core::Name;
use serde::{Deserialize, Serialize};

pub use crate::type_params::{
    close_over_constraints, close_over_constraints_with, TypeError, TypeParamDef, TypeParamEnv,
    TypeParamId, TypeParamOwner, TypeParamRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Bool,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Decimal => "decimal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedTypeKind {
    Class,
    Interface,
    Struct { readonly: bool },
    Enum,
    Delegate,
}

/// A nominal type reference, e.g. `List<T>` or `Point`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedType {
    pub name: Name,
    pub args: Vec<Type>,
    pub kind: NamedTypeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleElement {
    pub ty: Type,
    pub name: Option<Name>,
}

impl TupleElement {
    pub fn new(ty: Type, name: impl Into<Name>) -> Self {
        Self {
            ty,
            name: Some(name.into()),
        }
    }

    pub fn unnamed(ty: Type) -> Self {
        Self { ty, name: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "of")]
pub enum Type {
    /// The unit return type.
    Void,
    /// The universal top type, used whenever nothing better is known.
    Object,
    Primitive(PrimitiveType),
    Named(NamedType),
    TypeParam(TypeParamRef),
    Array(Box<Type>),
    /// `T?`: `Nullable<T>` for value types, a nullable annotation for
    /// reference types.
    Nullable(Box<Type>),
    Tuple(Vec<TupleElement>),
    /// The asynchronous task wrapper: `Task` (`None`) or `Task<T>`.
    Task(Option<Box<Type>>),
    Anonymous(Name),
    Error,
}

impl Type {
    pub fn class(name: impl Into<Name>) -> Type {
        Type::Named(NamedType {
            name: name.into(),
            args: Vec::new(),
            kind: NamedTypeKind::Class,
        })
    }

    pub fn strukt(name: impl Into<Name>, readonly: bool) -> Type {
        Type::Named(NamedType {
            name: name.into(),
            args: Vec::new(),
            kind: NamedTypeKind::Struct { readonly },
        })
    }

    pub fn string() -> Type {
        Type::class("string")
    }

    pub fn int() -> Type {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn bool() -> Type {
        Type::Primitive(PrimitiveType::Bool)
    }

    pub fn nullable(inner: Type) -> Type {
        Type::Nullable(Box::new(inner))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// Value types are copied on assignment: primitives, structs, enums,
    /// tuples and `Nullable<T>` over any of those.
    pub fn is_value_type(&self) -> bool {
        match self {
            Type::Primitive(_) | Type::Tuple(_) => true,
            Type::Named(named) => matches!(
                named.kind,
                NamedTypeKind::Struct { .. } | NamedTypeKind::Enum
            ),
            Type::Nullable(inner) => inner.is_value_type(),
            Type::Void
            | Type::Object
            | Type::TypeParam(_)
            | Type::Array(_)
            | Type::Task(_)
            | Type::Anonymous(_)
            | Type::Error => false,
        }
    }

    pub fn is_reference_type(&self) -> bool {
        match self {
            Type::Object | Type::Array(_) | Type::Task(_) | Type::Anonymous(_) => true,
            Type::Named(named) => !matches!(
                named.kind,
                NamedTypeKind::Struct { .. } | NamedTypeKind::Enum
            ),
            Type::Nullable(inner) => inner.is_reference_type(),
            Type::Void
            | Type::Primitive(_)
            | Type::TypeParam(_)
            | Type::Tuple(_)
            | Type::Error => false,
        }
    }

    /// A struct declared in source, as opposed to a built-in primitive.
    pub fn is_user_defined_struct(&self) -> bool {
        matches!(
            self,
            Type::Named(NamedType {
                kind: NamedTypeKind::Struct { .. },
                ..
            })
        )
    }

    /// A struct whose instance methods may mutate `this`.
    pub fn is_mutable_struct(&self) -> bool {
        matches!(
            self,
            Type::Named(NamedType {
                kind: NamedTypeKind::Struct { readonly: false },
                ..
            })
        )
    }

    /// A reference type carrying a `?` annotation.
    pub fn is_annotated_reference(&self) -> bool {
        matches!(self, Type::Nullable(inner) if inner.is_reference_type())
    }

    /// Drops a nullable annotation from a reference type. Value types keep
    /// their `Nullable<T>` wrapper because it changes their representation.
    pub fn without_nullable_annotation(&self) -> Type {
        match self {
            Type::Nullable(inner) if inner.is_reference_type() => (**inner).clone(),
            other => other.clone(),
        }
    }

    pub fn contains_anonymous(&self) -> bool {
        match self {
            Type::Anonymous(_) => true,
            Type::Named(named) => named.args.iter().any(Type::contains_anonymous),
            Type::Array(inner) | Type::Nullable(inner) => inner.contains_anonymous(),
            Type::Tuple(elems) => elems.iter().any(|elem| elem.ty.contains_anonymous()),
            Type::Task(inner) => inner.as_deref().is_some_and(Type::contains_anonymous),
            Type::Void
            | Type::Object
            | Type::Primitive(_)
            | Type::TypeParam(_)
            | Type::Error => false,
        }
    }

    /// Replaces every anonymous type (at any depth) with [`Type::Object`].
    pub fn replace_anonymous(&self) -> Type {
        match self {
            Type::Anonymous(_) => Type::Object,
            Type::Named(named) => Type::Named(NamedType {
                name: named.name.clone(),
                args: named.args.iter().map(Type::replace_anonymous).collect(),
                kind: named.kind,
            }),
            Type::Array(inner) => Type::Array(Box::new(inner.replace_anonymous())),
            Type::Nullable(inner) => Type::Nullable(Box::new(inner.replace_anonymous())),
            Type::Tuple(elems) => Type::Tuple(
                elems
                    .iter()
                    .map(|elem| TupleElement {
                        ty: elem.ty.replace_anonymous(),
                        name: elem.name.clone(),
                    })
                    .collect(),
            ),
            Type::Task(inner) => {
                Type::Task(inner.as_ref().map(|inner| Box::new(inner.replace_anonymous())))
            }
            other => other.clone(),
        }
    }

    /// `void` becomes `Task`, anything else `T` becomes `Task<T>`.
    pub fn wrap_task(self) -> Type {
        match self {
            Type::Void => Type::Task(None),
            other => Type::Task(Some(Box::new(other))),
        }
    }

    /// Inverse of [`Type::wrap_task`]. Non-task types are returned unchanged.
    pub fn unwrap_task(self) -> Type {
        match self {
            Type::Task(None) => Type::Void,
            Type::Task(Some(inner)) => *inner,
            other => other,
        }
    }

    /// Every type parameter referenced by this type, in first-use order,
    /// appended to `out` without duplicates.
    pub fn collect_type_params(&self, out: &mut Vec<TypeParamRef>) {
        match self {
            Type::TypeParam(param) => {
                if !out.iter().any(|seen| seen.id == param.id) {
                    out.push(param.clone());
                }
            }
            Type::Named(named) => {
                for arg in &named.args {
                    arg.collect_type_params(out);
                }
            }
            Type::Array(inner) | Type::Nullable(inner) => inner.collect_type_params(out),
            Type::Tuple(elems) => {
                for elem in elems {
                    elem.ty.collect_type_params(out);
                }
            }
            Type::Task(inner) => {
                if let Some(inner) = inner {
                    inner.collect_type_params(out);
                }
            }
            Type::Void
            | Type::Object
            | Type::Primitive(_)
            | Type::Anonymous(_)
            | Type::Error => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Object => f.write_str("object"),
            Type::Primitive(prim) => f.write_str(prim.keyword()),
            Type::Named(named) => {
                f.write_str(named.name.as_str())?;
                if !named.args.is_empty() {
                    f.write_str("<")?;
                    write_comma_separated(f, &named.args)?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            Type::TypeParam(param) => f.write_str(param.name.as_str()),
            Type::Array(inner) => write!(f, "{inner}[]"),
            Type::Nullable(inner) => write!(f, "{inner}?"),
            Type::Tuple(elems) => {
                f.write_str("(")?;
                for (idx, elem) in elems.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    match &elem.name {
                        Some(name) => write!(f, "{} {name}", elem.ty)?,
                        None => write!(f, "{}", elem.ty)?,
                    }
                }
                f.write_str(")")
            }
            Type::Task(None) => f.write_str("Task"),
            Type::Task(Some(inner)) => write!(f, "Task<{inner}>"),
            Type::Anonymous(name) => write!(f, "<anonymous {name}>"),
            Type::Error => f.write_str("?"),
        }
    }
}

fn write_comma_separated(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (idx, ty) in types.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(arg: Type) -> Type {
        Type::Named(NamedType {
            name: Name::new("List"),
            args: vec![arg],
            kind: NamedTypeKind::Class,
        })
    }

    fn param(id: u32, name: &str) -> Type {
        Type::TypeParam(TypeParamRef {
            id: TypeParamId(id),
            name: Name::new(name),
        })
    }

    #[test]
    fn value_type_predicates() {
        assert!(Type::int().is_value_type());
        assert!(Type::strukt("Point", false).is_value_type());
        assert!(Type::nullable(Type::int()).is_value_type());
        assert!(!Type::string().is_value_type());
        assert!(!Type::nullable(Type::string()).is_value_type());
        assert!(!param(0, "T").is_value_type());
        assert!(!param(0, "T").is_reference_type());

        assert!(Type::strukt("Point", false).is_mutable_struct());
        assert!(!Type::strukt("Point", true).is_mutable_struct());
        assert!(Type::strukt("Point", true).is_user_defined_struct());
        assert!(!Type::int().is_user_defined_struct());
    }

    #[test]
    fn nullable_annotation_only_strips_reference_types() {
        let annotated = Type::nullable(Type::string());
        assert!(annotated.is_annotated_reference());
        assert_eq!(annotated.without_nullable_annotation(), Type::string());

        let nullable_int = Type::nullable(Type::int());
        assert!(!nullable_int.is_annotated_reference());
        assert_eq!(nullable_int.without_nullable_annotation(), nullable_int);
    }

    #[test]
    fn anonymous_types_are_replaced_at_any_depth() {
        let ty = Type::Tuple(vec![
            TupleElement::new(list_of(Type::Anonymous(Name::new("a"))), "items"),
            TupleElement::unnamed(Type::int()),
        ]);
        assert!(ty.contains_anonymous());

        let replaced = ty.replace_anonymous();
        assert!(!replaced.contains_anonymous());
        assert_eq!(replaced.to_string(), "(List<object> items, int)");
    }

    #[test]
    fn task_wrapping() {
        assert_eq!(Type::Void.wrap_task(), Type::Task(None));
        assert_eq!(Type::Void.wrap_task().to_string(), "Task");
        assert_eq!(Type::int().wrap_task().to_string(), "Task<int>");
        assert_eq!(Type::int().wrap_task().unwrap_task(), Type::int());
        assert_eq!(Type::string().unwrap_task(), Type::string());
    }

    #[test]
    fn type_params_are_collected_in_first_use_order() {
        let ty = Type::Tuple(vec![
            TupleElement::unnamed(list_of(param(2, "U"))),
            TupleElement::unnamed(Type::Array(Box::new(param(1, "T")))),
            TupleElement::unnamed(param(2, "U")),
        ]);
        let mut out = Vec::new();
        ty.collect_type_params(&mut out);
        let names: Vec<_> = out.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["U", "T"]);
    }
}
