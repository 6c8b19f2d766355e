//! Type intersection and the structural unifier it relies on.
//!
//! `intersect` answers the most specific type that is a subtype of every
//! input, or `None` when no value can inhabit all of them. `None` is
//! distinct from `Any?`, which is the intersection of nothing at all.

use crate::intern::TypeDatabase;
use crate::subtype::SubtypeChecker;
use crate::type_utils::{can_have_subtypes, make_not_nullable, make_nullable_as_specified};
use crate::types::{ConstructorId, ConstructorKind, TypeData, TypeId, TypeProjection};
use crate::variance::Variance;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::collections::hash_map::Entry;
use tracing::{debug, trace};

/// Intersection of `types`.
///
/// Members that have a subtype among the other members are dropped, and
/// duplicates by mutual subtyping collapse to one. A type that cannot have
/// subtypes (`Int`) must be related to every other member, otherwise the
/// intersection is empty. The result is nullable only when every input is.
pub fn intersect(db: &dyn TypeDatabase, types: &[TypeId]) -> Option<TypeId> {
    let unique: IndexSet<TypeId, FxBuildHasher> = types.iter().map(|&ty| db.canonical(ty)).collect();
    match unique.len() {
        0 => return Some(db.builtins().nullable_any),
        1 => return unique.first().copied(),
        _ => {}
    }
    trace!(count = unique.len(), "intersect");

    let mut all_nullable = true;
    let mut nothing_present = false;
    let mut stripped = Vec::with_capacity(unique.len());
    for &ty in &unique {
        nothing_present |= db.is_nothing(ty);
        all_nullable &= db.is_nullable(ty);
        stripped.push(make_not_nullable(db, ty));
    }
    if nothing_present {
        return Some(db.builtins().nothing(all_nullable));
    }

    let mut checker = SubtypeChecker::new(db);
    let mut survivors: Vec<TypeId> = Vec::new();
    'outer: for &ty in &stripped {
        if !can_have_subtypes(db, ty) {
            for &other in &stripped {
                if !may_be_equal(db, ty, other)
                    && !checker.is_subtype_of(ty, other)
                    && !checker.is_subtype_of(other, ty)
                {
                    debug!(ty = ty.0, other = other.0, "intersection is empty");
                    return None;
                }
            }
            return Some(make_nullable_as_specified(db, ty, all_nullable));
        }

        // Only a proper subtype replaces `ty`; mutual subtypes are
        // collapsed by the equality check below.
        for &other in &stripped {
            if other != ty && checker.is_subtype_of(other, ty) && !checker.is_subtype_of(ty, other) {
                continue 'outer;
            }
        }
        for &kept in &survivors {
            if checker.equal_types(kept, ty) {
                continue 'outer;
            }
        }
        survivors.push(ty);
    }

    match survivors.as_slice() {
        // Unreachable for a finite set ordered by proper subtyping; keep
        // the first member rather than report an empty intersection.
        [] => Some(make_nullable_as_specified(db, stripped[0], all_nullable)),
        [single] => Some(make_nullable_as_specified(db, *single, all_nullable)),
        many => {
            let constructor = db.constructors().intersection(many);
            Some(db.simple(constructor, &[], all_nullable))
        }
    }
}

/// Members of an intersection type, or `None` for any other type.
pub fn intersection_members(db: &dyn TypeDatabase, ty: TypeId) -> Option<Vec<TypeId>> {
    let constructor = db.lookup(ty).constructor()?;
    let info = db.constructor(constructor);
    (info.kind == ConstructorKind::Intersection).then(|| info.supertypes.clone())
}

// =============================================================================
// Unification
// =============================================================================

/// Whether some assignment of type parameters makes `a` a subtype of `b`.
///
/// Type-parameter references on either side act as variables and each
/// variable binds to one type (up to equality) for the whole comparison.
/// `Int` may be a `Comparable<T>` with `T := Int`; `Int?` is never an `Int`.
pub fn may_be_equal(db: &dyn TypeDatabase, a: TypeId, b: TypeId) -> bool {
    let mut unifier = Unifier {
        db,
        checker: SubtypeChecker::new(db),
        bindings: FxHashMap::default(),
    };
    unifier.fits(a, b)
}

struct Unifier<'a> {
    db: &'a dyn TypeDatabase,
    checker: SubtypeChecker<'a>,
    bindings: FxHashMap<ConstructorId, TypeId>,
}

impl Unifier<'_> {
    /// `sub <: sup` for the bindings made so far, extending them as needed.
    fn fits(&mut self, sub: TypeId, sup: TypeId) -> bool {
        let db = self.db;
        let (
            TypeData::Simple {
                constructor: sub_constructor,
                nullable: sub_nullable,
                ..
            },
            TypeData::Simple {
                constructor: sup_constructor,
                arguments: sup_arguments,
                nullable: sup_nullable,
            },
        ) = (db.lookup(sub), db.lookup(sup))
        else {
            // Error types unify with anything.
            return true;
        };

        if self.is_variable(sup_constructor) {
            let value = if sup_nullable { make_not_nullable(db, sub) } else { db.canonical(sub) };
            return self.bind(sup_constructor, value);
        }
        if sub_nullable && !sup_nullable {
            return false;
        }
        if self.is_variable(sub_constructor) {
            let value = if sub_nullable { make_not_nullable(db, sup) } else { db.canonical(sup) };
            return self.bind(sub_constructor, value);
        }
        if db.is_nothing(sub) {
            return true;
        }

        let Some(found) = self
            .checker
            .find_corresponding_supertype(make_not_nullable(db, sub), sup_constructor)
        else {
            return false;
        };
        if db.is_error(found) {
            return true;
        }
        let found_arguments = db.lookup(found).arguments().to_vec();
        if found_arguments.len() != sup_arguments.len() {
            return false;
        }
        let parameters = db.constructor(sup_constructor).parameters.clone();
        found_arguments
            .iter()
            .zip(&sup_arguments)
            .enumerate()
            .all(|(index, (&from_sub, &from_sup))| {
                let declared = parameters
                    .get(index)
                    .map_or(Variance::Invariant, |&p| db.constructor(p).variance());
                self.fits_argument(from_sub, from_sup, declared)
            })
    }

    fn fits_argument(&mut self, from_sub: TypeProjection, from_sup: TypeProjection, declared: Variance) -> bool {
        let expected = if from_sup.kind == Variance::Invariant {
            declared
        } else {
            from_sup.kind
        };
        match expected {
            Variance::Invariant => self.same(from_sub, from_sup),
            Variance::Out => from_sub.kind != Variance::In && self.fits(from_sub.ty, from_sup.ty),
            Variance::In => from_sub.kind != Variance::Out && self.fits(from_sup.ty, from_sub.ty),
        }
    }

    /// Structural equality, with variables on either side.
    fn same(&mut self, left: TypeProjection, right: TypeProjection) -> bool {
        let db = self.db;
        let (
            TypeData::Simple {
                constructor: left_constructor,
                arguments: left_arguments,
                nullable: left_nullable,
            },
            TypeData::Simple {
                constructor: right_constructor,
                arguments: right_arguments,
                nullable: right_nullable,
            },
        ) = (db.lookup(left.ty), db.lookup(right.ty))
        else {
            return true;
        };

        if self.is_variable(right_constructor) {
            return self.bind(right_constructor, db.canonical(left.ty));
        }
        if self.is_variable(left_constructor) {
            return self.bind(left_constructor, db.canonical(right.ty));
        }

        left.kind == right.kind
            && left_nullable == right_nullable
            && left_constructor == right_constructor
            && left_arguments.len() == right_arguments.len()
            && left_arguments
                .iter()
                .zip(&right_arguments)
                .all(|(l, r)| self.same(*l, *r))
    }

    fn is_variable(&self, constructor: ConstructorId) -> bool {
        self.db.constructors().get_kind(constructor) == Some(ConstructorKind::TypeParameter)
    }

    fn bind(&mut self, variable: ConstructorId, ty: TypeId) -> bool {
        match self.bindings.entry(variable) {
            Entry::Occupied(bound) => {
                let bound = *bound.get();
                bound == ty || self.checker.equal_types(bound, ty)
            }
            Entry::Vacant(slot) => {
                slot.insert(ty);
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/intersect_tests.rs"]
mod tests;
