//! Member lookup on types.
//!
//! A type does not own a scope object. [`member_scope`] derives a small
//! [`MemberScope`] value from the type's constructor and the argument
//! bindings, and lookups run through it:
//!
//! | Type | Scope |
//! |------|-------|
//! | error type | `Error`: every name resolves to an error type |
//! | `Nothing` | `Empty` |
//! | class or interface instance | `Declared` with the argument bindings |
//! | type parameter | `Chained` over its bounds |
//! | intersection | `Chained` over its members, first match wins |
//!
//! A member found on a `Declared` scope is a read, so the binding is
//! applied in `out` position: `Props<in Int>.p` answers `Any?`, the upper
//! bound of `T`, rather than `Int`.

use crate::intern::TypeDatabase;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::substitution::{Substitution, TypeSubstitutor};
use crate::types::{ConstructorId, ConstructorKind, TypeData, TypeId};
use crate::variance::Variance;
use ktz_common::interner::Atom;
use std::sync::Arc;
use tracing::{trace, warn};

#[derive(Clone, Debug)]
pub enum MemberScope {
    Empty,
    Error,
    Declared {
        constructor: ConstructorId,
        substitution: Substitution,
    },
    Chained(Vec<MemberScope>),
}

/// Scope of members visible on `ty`.
pub fn member_scope(db: &dyn TypeDatabase, ty: TypeId) -> MemberScope {
    let data = db.lookup(ty);
    let TypeData::Simple { constructor, .. } = data else {
        return MemberScope::Error;
    };
    if constructor == db.builtins().nothing {
        return MemberScope::Empty;
    }
    let info = db.constructor(constructor);
    match info.kind {
        ConstructorKind::Error => MemberScope::Error,
        ConstructorKind::Intersection | ConstructorKind::TypeParameter | ConstructorKind::NumberValue => {
            MemberScope::Chained(
                info.supertypes
                    .iter()
                    .map(|&member| member_scope(db, member))
                    .collect(),
            )
        }
        ConstructorKind::Class | ConstructorKind::Interface => MemberScope::Declared {
            constructor,
            substitution: Substitution::for_type(db, ty),
        },
    }
}

impl MemberScope {
    /// Type of member `name`, or `None` if no such member is visible.
    pub fn lookup(&self, db: &dyn TypeDatabase, name: &str) -> Option<TypeId> {
        let atom = db.intern_string(name);
        let mut depth = DepthCounter::with_profile(RecursionProfile::MemberLookup);
        self.lookup_atom(db, atom, &mut depth)
    }

    fn lookup_atom(&self, db: &dyn TypeDatabase, name: Atom, depth: &mut DepthCounter) -> Option<TypeId> {
        match self {
            MemberScope::Empty => None,
            MemberScope::Error => Some(db.error_type(&format!(
                "member '{}' of an error type",
                db.resolve_atom(name)
            ))),
            MemberScope::Declared {
                constructor,
                substitution,
            } => lookup_declared(db, *constructor, substitution, name, depth),
            MemberScope::Chained(scopes) => scopes
                .iter()
                .find_map(|scope| scope.lookup_atom(db, name, depth)),
        }
    }

    /// Every visible member, nearest declaration first. A name declared
    /// again in a supertype is reported once.
    pub fn members(&self, db: &dyn TypeDatabase) -> Vec<(Arc<str>, TypeId)> {
        let mut names = Vec::new();
        let mut depth = DepthCounter::with_profile(RecursionProfile::MemberLookup);
        self.collect_names(db, &mut names, &mut depth);
        names
            .into_iter()
            .filter_map(|name| {
                let mut depth = DepthCounter::with_profile(RecursionProfile::MemberLookup);
                let ty = self.lookup_atom(db, name, &mut depth)?;
                Some((db.resolve_atom(name), ty))
            })
            .collect()
    }

    fn collect_names(&self, db: &dyn TypeDatabase, names: &mut Vec<Atom>, depth: &mut DepthCounter) {
        match self {
            MemberScope::Empty | MemberScope::Error => {}
            MemberScope::Declared {
                constructor,
                substitution,
            } => {
                if !depth.enter() {
                    return;
                }
                let info = db.constructor(*constructor);
                for (name, _) in &info.members {
                    if !names.contains(name) {
                        names.push(*name);
                    }
                }
                let substitutor = TypeSubstitutor::derived(db, substitution.clone());
                for &supertype in &info.supertypes {
                    let supertype = substitutor.safe_substitute(supertype, Variance::Invariant);
                    member_scope(db, supertype).collect_names(db, names, depth);
                }
                depth.leave();
            }
            MemberScope::Chained(scopes) => {
                for scope in scopes {
                    scope.collect_names(db, names, depth);
                }
            }
        }
    }
}

fn lookup_declared(
    db: &dyn TypeDatabase,
    constructor: ConstructorId,
    substitution: &Substitution,
    name: Atom,
    depth: &mut DepthCounter,
) -> Option<TypeId> {
    if !depth.enter() {
        warn!(constructor = constructor.0, "member lookup too deep");
        return None;
    }
    let info = db.constructor(constructor);
    let substitutor = TypeSubstitutor::derived(db, substitution.clone());
    let result = match info.member(name) {
        Some(member) => {
            trace!(constructor = constructor.0, member = member.0, "member found");
            Some(substitutor.safe_substitute(member, Variance::Out))
        }
        None => info.supertypes.iter().find_map(|&supertype| {
            let supertype = substitutor.safe_substitute(supertype, Variance::Invariant);
            if db.is_error(supertype) {
                return None;
            }
            member_scope(db, supertype).lookup_atom(db, name, depth)
        }),
    };
    depth.leave();
    result
}

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod tests;
