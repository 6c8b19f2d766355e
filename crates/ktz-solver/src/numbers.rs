//! Types of number literals.
//!
//! A literal such as `200` has no single primitive type until something
//! expects one. Its type is a [`ConstructorKind::NumberValue`] whose
//! supertypes are the primitive number types that can hold the value:
//!
//! | Literal | Supertypes |
//! |---------|------------|
//! | `1` | `Int`, `Byte`, `Short`, `Long` |
//! | `200` | `Int`, `Short`, `Long` |
//! | `3000000000` | `Long` |
//! | `1.5` | `Double`, `Float` |
//!
//! Without an expected type the literal defaults to `Double`, then `Int`,
//! then `Long`, whichever it can be.

use crate::common_supertype::common_supertype;
use crate::intern::TypeDatabase;
use crate::subtype::is_subtype_of;
use crate::types::{ConstructorKind, TypeId};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use std::fmt;
use tracing::trace;

/// Value of a number literal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberLiteral {
    Integer(i64),
    Floating(f64),
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberLiteral::Integer(value) => write!(f, "{value}"),
            NumberLiteral::Floating(value) => write!(f, "{value:?}"),
        }
    }
}

/// Type of `literal`. Equal literals share one type.
pub fn number_value_type(db: &dyn TypeDatabase, literal: NumberLiteral) -> TypeId {
    let name = db.intern_string(&literal.to_string());
    let constructor = db
        .constructors()
        .number_value(name, || primitive_types_for(db, literal));
    db.simple(constructor, &[], false)
}

fn primitive_types_for(db: &dyn TypeDatabase, literal: NumberLiteral) -> Vec<TypeId> {
    let b = db.builtins();
    match literal {
        NumberLiteral::Integer(value) => {
            let mut primitives = Vec::with_capacity(4);
            if i32::try_from(value).is_ok() {
                primitives.push(b.int_type);
            }
            if i8::try_from(value).is_ok() {
                primitives.push(b.byte_type);
            }
            if i16::try_from(value).is_ok() {
                primitives.push(b.short_type);
            }
            primitives.push(b.long_type);
            primitives
        }
        NumberLiteral::Floating(_) => vec![b.double_type, b.float_type],
    }
}

pub fn is_number_value_type(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    db.lookup(ty)
        .constructor()
        .is_some_and(|c| db.constructors().get_kind(c) == Some(ConstructorKind::NumberValue))
}

/// `Double`, `Int` or `Long`, in that order of preference, if present.
fn default_primitive_among(db: &dyn TypeDatabase, candidates: &[TypeId]) -> Option<TypeId> {
    let b = db.builtins();
    [b.double_type, b.int_type, b.long_type]
        .into_iter()
        .find(|preferred| candidates.contains(preferred))
}

/// The primitive type a literal takes when nothing is expected of it.
///
/// # Panics
///
/// If `number_value` is not the type of a number literal.
pub fn default_primitive_number_type(db: &dyn TypeDatabase, number_value: TypeId) -> TypeId {
    let primitives = db.constructor(db.constructor_of(number_value)).supertypes.clone();
    match default_primitive_among(db, &primitives) {
        Some(primitive) => primitive,
        None => panic!("number value type {number_value:?} has no Double, Int or Long supertype"),
    }
}

/// The first primitive type of `number_value` that fits `expected`, or the
/// default one. An absent or erroneous expectation picks the default.
pub fn primitive_number_type(
    db: &dyn TypeDatabase,
    number_value: TypeId,
    expected: Option<TypeId>,
) -> TypeId {
    let Some(expected) = expected.filter(|&e| !db.is_error(e)) else {
        return default_primitive_number_type(db, number_value);
    };
    let primitives = db.constructor(db.constructor_of(number_value)).supertypes.clone();
    primitives
        .into_iter()
        .find(|&primitive| is_subtype_of(db, primitive, expected))
        .unwrap_or_else(|| default_primitive_number_type(db, number_value))
}

/// Split `types` into `(others, number values)`, each without duplicates and
/// in input order.
pub fn filter_number_types(db: &dyn TypeDatabase, types: &[TypeId]) -> (Vec<TypeId>, Vec<TypeId>) {
    let mut others: IndexSet<TypeId, FxBuildHasher> = IndexSet::default();
    let mut numbers: IndexSet<TypeId, FxBuildHasher> = IndexSet::default();
    for &ty in types {
        if is_number_value_type(db, ty) {
            numbers.insert(ty);
        } else {
            others.insert(ty);
        }
    }
    (others.into_iter().collect(), numbers.into_iter().collect())
}

/// One type for several number literals.
///
/// The preferred primitive type shared by all of them wins (`1` and `200`
/// give `Int`, `1` and `3000000000` give `Long`). Without a shared one the
/// literals are joined through their default primitive types. `None` for
/// no literals.
pub fn common_supertype_for_number_types(db: &dyn TypeDatabase, numbers: &[TypeId]) -> Option<TypeId> {
    let (&first, rest) = numbers.split_first()?;
    let supertypes_of = |ty: TypeId| db.constructor(db.constructor_of(ty)).supertypes.clone();

    let mut shared = supertypes_of(first);
    for &ty in rest {
        let next = supertypes_of(ty);
        shared.retain(|candidate| next.contains(candidate));
    }
    if let Some(primitive) = default_primitive_among(db, &shared) {
        trace!(count = numbers.len(), primitive = primitive.0, "shared number type");
        return Some(primitive);
    }

    let defaults: Vec<TypeId> = numbers
        .iter()
        .map(|&ty| {
            if is_number_value_type(db, ty) {
                default_primitive_number_type(db, ty)
            } else {
                ty
            }
        })
        .collect();
    Some(common_supertype(db, &defaults))
}

#[cfg(test)]
#[path = "tests/numbers_tests.rs"]
mod tests;
