//! Small queries and constructors over types.

use crate::intern::TypeDatabase;
use crate::intersect::intersect;
use crate::subtype::is_subtype_of;
use crate::substitution::{Substitution, TypeSubstitutor};
use crate::types::{ConstructorId, TypeData, TypeId, TypeProjection};
use crate::variance::Variance;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashSet};

// =============================================================================
// Nullability
// =============================================================================

/// `ty` with its nullability set to `nullable`. Error types are unchanged.
pub fn make_nullable_as_specified(db: &dyn TypeDatabase, ty: TypeId, nullable: bool) -> TypeId {
    match db.lookup(ty) {
        TypeData::Simple {
            constructor,
            arguments,
            nullable: current,
        } => {
            if current == nullable {
                db.canonical(ty)
            } else {
                db.intern(TypeData::Simple {
                    constructor,
                    arguments,
                    nullable,
                })
            }
        }
        _ => db.canonical(ty),
    }
}

pub fn make_nullable(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    make_nullable_as_specified(db, ty, true)
}

pub fn make_not_nullable(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    make_nullable_as_specified(db, ty, false)
}

/// Make `ty` nullable when `nullable` is set, otherwise leave it alone.
pub fn make_nullable_if_needed(db: &dyn TypeDatabase, ty: TypeId, nullable: bool) -> TypeId {
    if nullable {
        make_nullable(db, ty)
    } else {
        db.canonical(ty)
    }
}

// =============================================================================
// Default types and projections
// =============================================================================

/// Unsubstituted type of a constructor: `Map<K, V>` for `class Map<K, V>`.
pub fn default_type(db: &dyn TypeDatabase, constructor: ConstructorId) -> TypeId {
    let info = db.constructor(constructor);
    let arguments = default_type_projections(db, &info.parameters);
    db.simple(constructor, &arguments, false)
}

/// One invariant projection per parameter, each referring to the parameter.
pub fn default_type_projections(
    db: &dyn TypeDatabase,
    parameters: &[ConstructorId],
) -> Vec<TypeProjection> {
    parameters
        .iter()
        .map(|&p| TypeProjection::invariant(db.simple(p, &[], false)))
        .collect()
}

/// Upper bounds of a type parameter folded into one type.
///
/// A single bound is returned as is; several bounds are intersected, and an
/// empty intersection degrades to `Nothing`.
pub fn upper_bounds_as_type(db: &dyn TypeDatabase, parameter: ConstructorId) -> TypeId {
    let bounds = &db.constructor(parameter).supertypes;
    match bounds.as_slice() {
        [] => db.builtins().nullable_any,
        [single] => db.canonical(*single),
        many => intersect(db, many).unwrap_or(db.builtins().nothing_type),
    }
}

/// `*` for a parameter: `out` its upper bound.
pub fn star_projection(db: &dyn TypeDatabase, parameter: ConstructorId) -> TypeProjection {
    TypeProjection::out(upper_bounds_as_type(db, parameter))
}

/// Apply a class to plain type arguments: `substitute_parameters(List, [Int])`.
pub fn substitute_parameters(
    db: &dyn TypeDatabase,
    constructor: ConstructorId,
    arguments: &[TypeId],
) -> TypeId {
    let projections: Vec<_> = arguments
        .iter()
        .map(|&ty| TypeProjection::invariant(ty))
        .collect();
    substitute_projections_for_parameters(db, constructor, &projections)
}

/// Apply a class to projections.
///
/// # Panics
///
/// If the number of projections differs from the number of parameters.
pub fn substitute_projections_for_parameters(
    db: &dyn TypeDatabase,
    constructor: ConstructorId,
    projections: &[TypeProjection],
) -> TypeId {
    let info = db.constructor(constructor);
    assert_eq!(
        info.parameters.len(),
        projections.len(),
        "type parameter counts do not match for {}",
        db.resolve_atom(info.name)
    );
    let map = info
        .parameters
        .iter()
        .copied()
        .zip(projections.iter().copied())
        .collect();
    TypeSubstitutor::new(db, Substitution::from_map(map))
        .safe_substitute(default_type(db, constructor), Variance::Invariant)
}

// =============================================================================
// Supertypes
// =============================================================================

/// Declared supertypes of `ty`'s constructor, with `ty`'s arguments
/// substituted in.
pub fn immediate_supertypes(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    let Some(constructor) = db.lookup(ty).constructor() else {
        return Vec::new();
    };
    let substitutor = TypeSubstitutor::for_type(db, ty);
    db.constructor(constructor)
        .supertypes
        .iter()
        .map(|&st| substitutor.safe_substitute(st, Variance::Invariant))
        .collect()
}

/// Transitive supertypes of `ty` in discovery order, excluding `ty` itself.
pub fn all_supertypes(db: &dyn TypeDatabase, ty: TypeId) -> IndexSet<TypeId, FxBuildHasher> {
    let mut result = IndexSet::default();
    let mut stack = vec![ty];
    while let Some(current) = stack.pop() {
        for supertype in immediate_supertypes(db, current) {
            if result.insert(supertype) {
                stack.push(supertype);
            }
        }
    }
    result
}

/// Whether some supertype of a type-parameter type is nullable. Classes
/// never have nullable supertypes.
pub fn has_nullable_super_type(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    let Some(constructor) = db.lookup(ty).constructor() else {
        return false;
    };
    if db.constructor(constructor).kind.is_classifier() {
        return false;
    }
    immediate_supertypes(db, ty)
        .into_iter()
        .any(|st| db.is_nullable(st) || has_nullable_super_type(db, st))
}

/// Both types are instances of the same class or interface.
pub fn equal_classes(db: &dyn TypeDatabase, a: TypeId, b: TypeId) -> bool {
    let (Some(ca), Some(cb)) = (db.lookup(a).constructor(), db.lookup(b).constructor()) else {
        return false;
    };
    ca == cb && db.constructor(ca).kind.is_classifier()
}

// =============================================================================
// Dependency queries
// =============================================================================

/// `key` is `value`'s constructor or appears anywhere in its arguments.
pub fn type_constructor_used_in_type(db: &dyn TypeDatabase, key: ConstructorId, value: TypeId) -> bool {
    let data = db.lookup(value);
    if data.constructor() == Some(key) {
        return true;
    }
    data.arguments()
        .iter()
        .any(|arg| type_constructor_used_in_type(db, key, arg.ty))
}

pub fn depends_on_type_constructors(
    db: &dyn TypeDatabase,
    ty: TypeId,
    constructors: &FxHashSet<ConstructorId>,
) -> bool {
    let data = db.lookup(ty);
    if data.constructor().is_some_and(|c| constructors.contains(&c)) {
        return true;
    }
    data.arguments()
        .iter()
        .any(|arg| depends_on_type_constructors(db, arg.ty, constructors))
}

pub fn depends_on_type_parameters(
    db: &dyn TypeDatabase,
    ty: TypeId,
    parameters: &[ConstructorId],
) -> bool {
    let set: FxHashSet<_> = parameters.iter().copied().collect();
    depends_on_type_constructors(db, ty, &set)
}

/// `ty` is one of `candidates` or contains one of them as an argument,
/// at any depth.
pub fn equals_or_contains_as_argument(db: &dyn TypeDatabase, ty: TypeId, candidates: &[TypeId]) -> bool {
    let ty = db.canonical(ty);
    if candidates.iter().any(|&c| db.canonical(c) == ty) {
        return true;
    }
    db.lookup(ty)
        .arguments()
        .iter()
        .any(|arg| equals_or_contains_as_argument(db, arg.ty, candidates))
}

/// Nesting depth of `ty`: 1 plus the deepest argument.
pub fn type_depth(db: &dyn TypeDatabase, ty: TypeId) -> u32 {
    1 + max_type_depth(db, db.lookup(ty).arguments().iter().map(|arg| arg.ty))
}

/// Deepest of `types`, 0 when empty.
pub fn max_type_depth(db: &dyn TypeDatabase, types: impl IntoIterator<Item = TypeId>) -> u32 {
    types
        .into_iter()
        .map(|ty| type_depth(db, ty))
        .max()
        .unwrap_or(0)
}

// =============================================================================
// Subtype possibility
// =============================================================================

/// Whether a value of some type other than `ty` itself may inhabit `ty`.
///
/// False only for non-null instances of sealed classes whose arguments are
/// pinned down exactly, such as `Int` or `Array<String>` for a final
/// `Array`.
pub fn can_have_subtypes(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    let data = db.lookup(ty);
    let TypeData::Simple {
        constructor,
        arguments,
        nullable,
    } = data
    else {
        return false;
    };
    if nullable {
        return true;
    }
    let info = db.constructor(constructor);
    if !info.sealed {
        return true;
    }

    for (argument, &parameter) in arguments.iter().zip(&info.parameters) {
        let declared = db.constructor(parameter).variance();
        let open = match (declared, argument.kind) {
            (Variance::Invariant, Variance::Invariant) => {
                lower_than_bound(db, argument.ty, parameter) || can_have_subtypes(db, argument.ty)
            }
            (Variance::Invariant, Variance::In) => lower_than_bound(db, argument.ty, parameter),
            (Variance::Invariant, Variance::Out) => can_have_subtypes(db, argument.ty),
            (Variance::In, Variance::Out) | (Variance::Out, Variance::Invariant | Variance::Out) => {
                can_have_subtypes(db, argument.ty)
            }
            (Variance::In, _) | (Variance::Out, Variance::In) => {
                lower_than_bound(db, argument.ty, parameter)
            }
        };
        if open {
            return true;
        }
    }
    false
}

/// `argument` is a proper subtype of one of `parameter`'s bounds.
fn lower_than_bound(db: &dyn TypeDatabase, argument: TypeId, parameter: ConstructorId) -> bool {
    let argument_constructor = db.lookup(argument).constructor();
    db.constructor(parameter).supertypes.iter().any(|&bound| {
        is_subtype_of(db, argument, bound) && argument_constructor != db.lookup(bound).constructor()
    })
}

/// No value can inhabit both types.
pub fn is_intersection_empty(db: &dyn TypeDatabase, a: TypeId, b: TypeId) -> bool {
    intersect(db, &[a, b]).is_none()
}

#[cfg(test)]
#[path = "tests/type_utils_tests.rs"]
mod tests;
