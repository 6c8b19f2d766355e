//! Subtype checking with declaration-site and use-site variance.
//!
//! `sub <: sup` is decided in four steps:
//!
//! 1. An error type on either side makes the check succeed.
//! 2. A nullable `sub` never fits a non-null `sup`; `Nothing` and
//!    `Nothing?` fit everything that survives this rule.
//! 3. Walk `sub`'s supertypes depth-first, substituting `sub`'s arguments
//!    along every edge, until the constructor of `sup` is found.
//! 4. Compare the found type with `sup` argument by argument. For each
//!    parameter both sides contribute an *out* bound and an *in* bound:
//!
//! | Projection | out bound | in bound |
//! |------------|-----------|----------|
//! | `X` on an invariant parameter | `X` | `X` |
//! | `out X`, or any `X` on an `out` parameter | `X` | `Nothing` |
//! | `in X`, or any `X` on an `in` parameter | upper bound of the parameter | `X` |
//!
//!    The argument fits iff `subOut <: superOut` and `superIn <: subIn`.
//!
//! Equality is mutual subtyping and never short-circuits on identical ids
//! beyond what the rules above already give.

use crate::diagnostics::{
    ArgumentDirection, DiagnosticTracer, FastTracer, SubtypeFailureReason, SubtypeTracer,
};
use crate::intern::TypeDatabase;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::type_utils::{immediate_supertypes, make_nullable_if_needed, upper_bounds_as_type};
use crate::types::{ConstructorId, ConstructorKind, TypeId, TypeProjection};
use crate::variance::Variance;
use ktz_common::limits::{STACK_GROWTH_SIZE, STACK_RED_ZONE};
use tracing::{trace, warn};

/// `sub <: sup`.
pub fn is_subtype_of(db: &dyn TypeDatabase, sub: TypeId, sup: TypeId) -> bool {
    SubtypeChecker::new(db).is_subtype_of(sub, sup)
}

/// `a <: b` and `b <: a`.
pub fn equal_types(db: &dyn TypeDatabase, a: TypeId, b: TypeId) -> bool {
    SubtypeChecker::new(db).equal_types(a, b)
}

/// Why `sub <: sup` fails, or `None` when it holds.
pub fn explain_failure(
    db: &dyn TypeDatabase,
    sub: TypeId,
    sup: TypeId,
) -> Option<SubtypeFailureReason> {
    SubtypeChecker::new(db).explain_failure(sub, sup)
}

pub struct SubtypeChecker<'a> {
    db: &'a dyn TypeDatabase,
    depth: DepthCounter,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            depth: DepthCounter::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    pub fn is_subtype_of(&mut self, sub: TypeId, sup: TypeId) -> bool {
        trace!(sub = sub.0, sup = sup.0, "is_subtype_of");
        self.check(sub, sup, &mut FastTracer)
    }

    pub fn equal_types(&mut self, a: TypeId, b: TypeId) -> bool {
        self.check(a, b, &mut FastTracer) && self.check(b, a, &mut FastTracer)
    }

    pub fn explain_failure(&mut self, sub: TypeId, sup: TypeId) -> Option<SubtypeFailureReason> {
        let mut tracer = DiagnosticTracer::new();
        if self.check(sub, sup, &mut tracer) {
            return None;
        }
        Some(
            tracer
                .take_failure()
                .unwrap_or(SubtypeFailureReason::TypeMismatch { sub, sup }),
        )
    }

    /// Whether the depth limit was hit during an earlier check.
    pub fn depth_exceeded(&self) -> bool {
        self.depth.is_exceeded()
    }

    /// The supertype of `sub` whose constructor is `target`, with `sub`'s
    /// arguments substituted in. `sub` itself qualifies.
    pub fn find_corresponding_supertype(
        &mut self,
        sub: TypeId,
        target: ConstructorId,
    ) -> Option<TypeId> {
        let db = self.db;
        let constructor = db.lookup(sub).constructor()?;
        if constructor == target {
            return Some(db.canonical(sub));
        }
        if !self.depth.enter() {
            warn!(sub = sub.0, target = target.0, "supertype search too deep");
            return None;
        }
        let mut found = None;
        for supertype in immediate_supertypes(db, sub) {
            if db.is_error(supertype) {
                found = Some(supertype);
                break;
            }
            if let Some(result) = self.find_corresponding_supertype(supertype, target) {
                found = Some(result);
                break;
            }
        }
        self.depth.leave();
        found
    }

    fn check<T: SubtypeTracer>(&mut self, sub: TypeId, sup: TypeId, tracer: &mut T) -> bool {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH_SIZE, || {
            if !self.depth.enter() {
                warn!(sub = sub.0, sup = sup.0, "subtype check too deep");
                return tracer.on_mismatch(|| SubtypeFailureReason::DepthExceeded { sub, sup });
            }
            let result = self.check_rules(sub, sup, tracer);
            self.depth.leave();
            result
        })
    }

    fn check_rules<T: SubtypeTracer>(&mut self, sub: TypeId, sup: TypeId, tracer: &mut T) -> bool {
        let db = self.db;
        if db.is_error(sub) || db.is_error(sup) {
            return true;
        }
        let sup_data = db.lookup(sup);
        if !sup_data.is_nullable() && db.is_nullable(sub) {
            return tracer.on_mismatch(|| SubtypeFailureReason::NullabilityMismatch { sub, sup });
        }
        if db.is_nothing(sub) {
            return true;
        }
        let Some(sup_constructor) = sup_data.constructor() else {
            return true;
        };

        let sup_info = db.constructor(sup_constructor);
        if sup_info.kind == ConstructorKind::Intersection {
            // Must fit every member.
            for &member in &sup_info.supertypes {
                let member = make_nullable_if_needed(db, member, sup_data.is_nullable());
                if !self.check(sub, member, tracer) {
                    return false;
                }
            }
            return true;
        }

        let Some(found) = self.find_corresponding_supertype(sub, sup_constructor) else {
            return tracer.on_mismatch(|| SubtypeFailureReason::NoCorrespondingSupertype { sub, sup });
        };
        if db.is_error(found) {
            return true;
        }

        let found_data = db.lookup(found);
        let parameters = &sup_info.parameters;
        for (index, ((sub_arg, sup_arg), &parameter)) in found_data
            .arguments()
            .iter()
            .zip(sup_data.arguments())
            .zip(parameters)
            .enumerate()
        {
            let declared = db.constructor(parameter).variance();
            let sub_out = self.out_type(parameter, declared, *sub_arg);
            let sup_out = self.out_type(parameter, declared, *sup_arg);
            if !self.check(sub_out, sup_out, &mut FastTracer) {
                return tracer.on_mismatch(|| SubtypeFailureReason::ArgumentMismatch {
                    sub,
                    sup,
                    index,
                    direction: ArgumentDirection::Out,
                    nested_reason: self.explain_failure(sub_out, sup_out).map(Box::new),
                });
            }
            let sub_in = self.in_type(declared, *sub_arg);
            let sup_in = self.in_type(declared, *sup_arg);
            if !self.check(sup_in, sub_in, &mut FastTracer) {
                return tracer.on_mismatch(|| SubtypeFailureReason::ArgumentMismatch {
                    sub,
                    sup,
                    index,
                    direction: ArgumentDirection::In,
                    nested_reason: self.explain_failure(sup_in, sub_in).map(Box::new),
                });
            }
        }
        true
    }

    /// Upper bound guaranteed for reads through `argument`.
    fn out_type(&self, parameter: ConstructorId, declared: Variance, argument: TypeProjection) -> TypeId {
        if argument.kind == Variance::In || declared == Variance::In {
            upper_bounds_as_type(self.db, parameter)
        } else {
            argument.ty
        }
    }

    /// Lower bound guaranteed for writes through `argument`.
    fn in_type(&self, declared: Variance, argument: TypeProjection) -> TypeId {
        if argument.kind == Variance::Out || declared == Variance::Out {
            self.db.builtins().nothing_type
        } else {
            argument.ty
        }
    }
}

#[cfg(test)]
#[path = "tests/subtype_tests.rs"]
mod tests;
