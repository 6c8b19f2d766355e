//! Replacing type parameters by their upper bounds.
//!
//! Parameters may be bounded by each other (`<T, U : List<T>>`), so they
//! are processed in dependency order: every parameter's bound is rewritten
//! with the replacements chosen for the parameters it mentions. An F-bound
//! (`T : Comparable<T>`) still mentions its own parameter afterwards; that
//! self-reference is replaced by `Any?`.

use crate::dfs::post_order;
use crate::intern::TypeDatabase;
use crate::substitution::{Substitution, TypeSubstitutor};
use crate::type_utils::{type_constructor_used_in_type, upper_bounds_as_type};
use crate::types::{ConstructorId, TypeData, TypeId, TypeProjection};
use crate::variance::Variance;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// `parameters` ordered so that every parameter comes after the
/// parameters its bounds refer to. Cycles are broken arbitrarily.
pub fn sort_by_bound_dependencies(
    db: &dyn TypeDatabase,
    parameters: &[ConstructorId],
) -> Vec<ConstructorId> {
    let in_scope: FxHashSet<ConstructorId> = parameters.iter().copied().collect();
    post_order(
        parameters.iter().copied(),
        |&parameter| {
            let mut referenced = Vec::new();
            for &bound in &db.constructor(parameter).supertypes {
                collect_parameters(db, bound, &in_scope, &mut referenced);
            }
            referenced
        },
        |&parameter| parameter,
    )
}

fn collect_parameters(
    db: &dyn TypeDatabase,
    ty: TypeId,
    in_scope: &FxHashSet<ConstructorId>,
    out: &mut Vec<ConstructorId>,
) {
    let data = db.lookup(ty);
    if let TypeData::Simple { constructor, .. } = &data {
        if in_scope.contains(constructor) && !out.contains(constructor) {
            out.push(*constructor);
        }
    }
    for argument in data.arguments() {
        collect_parameters(db, argument.ty, in_scope, out);
    }
}

/// Substitutor mapping each of `parameters` to its upper bound, with the
/// bounds themselves free of the parameters.
pub fn bounds_substitutor<'a>(
    db: &'a dyn TypeDatabase,
    parameters: &[ConstructorId],
) -> TypeSubstitutor<'a> {
    let mut map: FxHashMap<ConstructorId, TypeProjection> = FxHashMap::default();
    for parameter in sort_by_bound_dependencies(db, parameters) {
        let bound = upper_bounds_as_type(db, parameter);
        let mut value = TypeSubstitutor::derived(db, Substitution::from_map(map.clone()))
            .safe_substitute(bound, Variance::Invariant);
        if type_constructor_used_in_type(db, parameter, value) {
            value = TypeSubstitutor::constant(db, &[parameter], db.builtins().nullable_any)
                .safe_substitute(value, Variance::Invariant);
        }
        trace!(parameter = parameter.0, bound = value.0, "bounds_substitutor");
        map.insert(parameter, TypeProjection::invariant(value));
    }
    TypeSubstitutor::derived(db, Substitution::from_map(map))
}

/// `ty` with every one of `parameters` replaced by its bound.
pub fn substitute_bounds(db: &dyn TypeDatabase, ty: TypeId, parameters: &[ConstructorId]) -> TypeId {
    if parameters.is_empty() {
        return ty;
    }
    bounds_substitutor(db, parameters).safe_substitute(ty, Variance::Invariant)
}

#[cfg(test)]
#[path = "tests/bounds_tests.rs"]
mod tests;
