use carve_core::{Cancelled, Name};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeParamId(pub u32);

/// A use of a type parameter inside a [`Type`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeParamRef {
    pub id: TypeParamId,
    pub name: Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeParamOwner {
    /// Declared by the containing method or local function.
    Method,
    /// Declared by the containing type; always in scope for a new member.
    Type,
}

/// The declaration of a type parameter, including its constraint clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub id: TypeParamId,
    pub name: Name,
    pub owner: TypeParamOwner,
    /// Types named in the `where` clause (interfaces, base class, or other
    /// type parameters).
    pub constraints: Vec<Type>,
}

impl TypeParamDef {
    pub fn to_ref(&self) -> TypeParamRef {
        TypeParamRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
    }
}

/// Lookup of type parameter declarations by id.
pub trait TypeParamEnv {
    fn type_param(&self, id: TypeParamId) -> Option<&TypeParamDef>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("type parameter {0:?} has no declaration in the semantic model")]
    UnknownTypeParam(TypeParamId),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

pub fn close_over_constraints(
    env: &dyn TypeParamEnv,
    roots: &[TypeParamRef],
) -> Result<Vec<TypeParamDef>, TypeError> {
    close_over_constraints_with(env, roots, &mut || Ok(()))
}

/// Returns the method-owned type parameters needed to declare `roots`: the
/// roots themselves plus, transitively, every type parameter mentioned in
/// their constraint clauses.
///
/// Order is first-use order of `roots`, followed by parameters discovered
/// through constraints in the order they were reached. Each parameter is
/// visited once, so constraint cycles (`T : IFoo<U>`, `U : IBar<T>`)
/// terminate.
pub fn close_over_constraints_with(
    env: &dyn TypeParamEnv,
    roots: &[TypeParamRef],
    check_cancelled: &mut dyn FnMut() -> Result<(), Cancelled>,
) -> Result<Vec<TypeParamDef>, TypeError> {
    let mut visited: IndexMap<TypeParamId, Option<&TypeParamDef>> = IndexMap::new();
    let mut queue: Vec<TypeParamId> = Vec::new();

    for root in roots {
        if visited.contains_key(&root.id) {
            continue;
        }
        visited.insert(root.id, None);
        queue.push(root.id);
    }

    let mut idx = 0;
    while idx < queue.len() {
        check_cancelled()?;

        let id = queue[idx];
        idx += 1;

        let def = env.type_param(id).ok_or(TypeError::UnknownTypeParam(id))?;
        visited.insert(id, Some(def));

        let mut mentioned = Vec::new();
        for constraint in &def.constraints {
            constraint.collect_type_params(&mut mentioned);
        }
        for param in mentioned {
            if visited.contains_key(&param.id) {
                continue;
            }
            visited.insert(param.id, None);
            queue.push(param.id);
        }
    }

    Ok(visited
        .into_values()
        .flatten()
        .filter(|def| def.owner == TypeParamOwner::Method)
        .cloned()
        .collect())
}
