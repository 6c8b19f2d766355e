//! Type-parameter substitution.
//!
//! A [`Substitution`] maps type-parameter constructors to projections. A
//! [`TypeSubstitutor`] applies one to a type, rewriting every reference to a
//! mapped parameter and composing variances along the way.
//!
//! ## Algorithm
//!
//! 1. An empty substitution returns the input unchanged.
//! 2. Error types are returned unchanged.
//! 3. A bare parameter reference (`T`, `T?`) is replaced by its value, with
//!    the nullability of the reference or-ed in, and the value is
//!    reconciled against the context variance.
//! 4. Any other type is *specialized*: same constructor and nullability,
//!    each argument substituted under the variance of its position.
//!
//! Reconciliation of a value `v` under context variance:
//!
//! | Context | `v` is `out X` | `v` is `in X` | otherwise |
//! |---------|----------------|---------------|-----------|
//! | invariant | keep `v` | keep `v` | keep `v` |
//! | in | conflict | `X` | `X` |
//! | out | `X` | upper bound of the parameter | `X` |
//!
//! A conflict at the top level fails the whole substitution
//! ([`TypeSubstitutor::substitute`] returns `None`). Inside an argument the
//! same situation is approximated with a star projection instead.
//!
//! ## Recursion
//!
//! Every replacement is specialized again under its context, so bindings
//! that refer to each other never bottom out. Exceeding
//! `MAX_SUBSTITUTION_DEPTH` nested calls is treated as a malformed type
//! graph and panics. The limit comes from
//! [`RecursionProfile::Substitution`] unless overridden with
//! [`TypeSubstitutor::with_recursion_profile`].

use crate::format::TypeFormatter;
use crate::intern::TypeDatabase;
use crate::recursion::RecursionProfile;
use crate::type_utils::{make_nullable, star_projection, type_constructor_used_in_type, upper_bounds_as_type};
use crate::types::{ConstructorId, TypeData, TypeId, TypeProjection};
use crate::variance::Variance;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

// =============================================================================
// SubstitutionConflict
// =============================================================================

/// An out-projected value met an in-position at the top of a substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstitutionConflict {
    pub message: String,
}

impl fmt::Display for SubstitutionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SubstitutionConflict {}

type SubstitutionResult<T> = Result<T, SubstitutionConflict>;

// =============================================================================
// Substitution
// =============================================================================

/// One layer of a composite substitution.
#[derive(Clone, Debug)]
pub enum SubstitutionLayer {
    /// Explicit parameter-to-projection map.
    Map(FxHashMap<ConstructorId, TypeProjection>),
    /// Every parameter in `keys` maps to the same `value`.
    Constant {
        keys: FxHashSet<ConstructorId>,
        value: TypeProjection,
    },
}

impl SubstitutionLayer {
    fn get(&self, key: ConstructorId) -> Option<TypeProjection> {
        match self {
            SubstitutionLayer::Map(map) => map.get(&key).copied(),
            SubstitutionLayer::Constant { keys, value } => keys.contains(&key).then_some(*value),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            SubstitutionLayer::Map(map) => map.is_empty(),
            SubstitutionLayer::Constant { keys, .. } => keys.is_empty(),
        }
    }
}

/// A mapping from type-parameter constructors to projections.
///
/// Layers are consulted in order; the first layer that maps a key wins.
#[derive(Clone, Debug, Default)]
pub struct Substitution {
    layers: Vec<Arc<SubstitutionLayer>>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(map: FxHashMap<ConstructorId, TypeProjection>) -> Self {
        Self {
            layers: vec![Arc::new(SubstitutionLayer::Map(map))],
        }
    }

    /// Bind the parameters of `ty`'s constructor to `ty`'s arguments.
    ///
    /// `Map<String, out Int>` binds `K -> String` and `V -> out Int`.
    pub fn for_type(db: &dyn TypeDatabase, ty: TypeId) -> Self {
        let data = db.lookup(ty);
        let TypeData::Simple {
            constructor,
            arguments,
            ..
        } = &data
        else {
            return Self::empty();
        };
        let parameters = db.constructor(*constructor).parameters.clone();
        let map: FxHashMap<_, _> = parameters
            .into_iter()
            .zip(arguments.iter().copied())
            .collect();
        Self::from_map(map)
    }

    /// Map every parameter in `parameters` to `ty`.
    pub fn constant(parameters: impl IntoIterator<Item = ConstructorId>, ty: TypeId) -> Self {
        Self {
            layers: vec![Arc::new(SubstitutionLayer::Constant {
                keys: parameters.into_iter().collect(),
                value: TypeProjection::invariant(ty),
            })],
        }
    }

    /// Chain substitutions; earlier ones take precedence.
    pub fn compose(parts: impl IntoIterator<Item = Substitution>) -> Self {
        Self {
            layers: parts
                .into_iter()
                .flat_map(|s| s.layers)
                .filter(|layer| !layer.is_empty())
                .collect(),
        }
    }

    pub fn get(&self, key: ConstructorId) -> Option<TypeProjection> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|layer| layer.is_empty())
    }

    fn explicit_entries(&self) -> impl Iterator<Item = (ConstructorId, TypeProjection)> + '_ {
        self.layers.iter().flat_map(|layer| match &**layer {
            SubstitutionLayer::Map(map) => map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            SubstitutionLayer::Constant { .. } => Vec::new(),
        })
    }
}

// =============================================================================
// TypeSubstitutor
// =============================================================================

/// Applies a [`Substitution`] to types.
pub struct TypeSubstitutor<'a> {
    db: &'a dyn TypeDatabase,
    substitution: Substitution,
    max_depth: u32,
}

impl<'a> TypeSubstitutor<'a> {
    /// Create a substitutor from an explicit substitution.
    ///
    /// # Panics
    ///
    /// If a parameter is mapped to a type that mentions the same parameter
    /// inside its arguments (`T -> Foo<T>`). Mapping a parameter to itself
    /// (`T -> T?`) is allowed.
    pub fn new(db: &'a dyn TypeDatabase, substitution: Substitution) -> Self {
        for (key, value) in substitution.explicit_entries() {
            let is_bare_key = db.lookup(value.ty).constructor() == Some(key);
            if !is_bare_key && type_constructor_used_in_type(db, key, value.ty) {
                let fmt = TypeFormatter::new(db);
                panic!(
                    "immediate recursion in substitution: {} -> {}",
                    fmt.format_constructor(key),
                    fmt.format_projection(value)
                );
            }
        }
        Self::derived(db, substitution)
    }

    /// Substitutor binding the parameters of `ty` to its arguments.
    pub fn for_type(db: &'a dyn TypeDatabase, ty: TypeId) -> Self {
        Self::derived(db, Substitution::for_type(db, ty))
    }

    /// Substitutor over a substitution that was derived from a type rather
    /// than written by hand, skipping the self-reference check.
    pub(crate) fn derived(db: &'a dyn TypeDatabase, substitution: Substitution) -> Self {
        Self {
            db,
            substitution,
            max_depth: RecursionProfile::Substitution.max_depth(),
        }
    }

    /// Replace the nesting limit.
    pub fn with_recursion_profile(mut self, profile: RecursionProfile) -> Self {
        self.max_depth = profile.max_depth();
        self
    }

    pub fn empty(db: &'a dyn TypeDatabase) -> Self {
        Self::derived(db, Substitution::empty())
    }

    /// Substitutor mapping each of `parameters` to `ty`.
    pub fn constant(db: &'a dyn TypeDatabase, parameters: &[ConstructorId], ty: TypeId) -> Self {
        Self::derived(db, Substitution::constant(parameters.iter().copied(), ty))
    }

    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    pub fn is_empty(&self) -> bool {
        self.substitution.is_empty()
    }

    /// Substitute into `ty` used at `variance`. `None` on a variance
    /// conflict.
    pub fn substitute(&self, ty: TypeId, variance: Variance) -> Option<TypeId> {
        if self.is_empty() {
            return Some(ty);
        }
        trace!(ty = ty.0, ?variance, "substitute");
        match self.unsafe_substitute(ty, variance, 0) {
            Ok(result) => Some(result),
            Err(conflict) => {
                debug!(ty = ty.0, %conflict, "substitution conflict");
                None
            }
        }
    }

    /// Like [`substitute`](Self::substitute), but a conflict yields an error
    /// type carrying the reason.
    pub fn safe_substitute(&self, ty: TypeId, variance: Variance) -> TypeId {
        if self.is_empty() {
            return ty;
        }
        match self.unsafe_substitute(ty, variance, 0) {
            Ok(result) => result,
            Err(conflict) => self
                .db
                .error_type(&format!("Substitution failed: {conflict}")),
        }
    }

    fn check_depth(&self, ty: TypeId, depth: u32) {
        if depth > self.max_depth {
            let fmt = TypeFormatter::new(self.db);
            panic!(
                "recursion depth of substitution exceeded {} \
                 while substituting into {}; the substitution is probably circular",
                self.max_depth,
                fmt.format(ty)
            );
        }
    }

    /// Value for parameter `key` with the reference's nullability or-ed in.
    fn value_with_nullability(&self, key: ConstructorId, nullable: bool) -> Option<TypeProjection> {
        let value = self.substitution.get(key)?;
        if nullable {
            Some(TypeProjection::new(value.kind, make_nullable(self.db, value.ty)))
        } else {
            Some(value)
        }
    }

    fn unsafe_substitute(
        &self,
        ty: TypeId,
        context: Variance,
        depth: u32,
    ) -> SubstitutionResult<TypeId> {
        self.check_depth(ty, depth);
        let data = self.db.lookup(ty);
        let TypeData::Simple {
            constructor,
            nullable,
            ..
        } = data
        else {
            return Ok(self.db.canonical(ty));
        };

        if let Some(value) = self.value_with_nullability(constructor, nullable) {
            let result =
                self.substitution_result(constructor, context, Variance::Invariant, value, depth + 1)?;
            return Ok(result.ty);
        }

        self.specialize(ty, context, depth + 1)
    }

    /// Rebuild `ty` with every argument substituted.
    fn specialize(&self, ty: TypeId, context: Variance, depth: u32) -> SubstitutionResult<TypeId> {
        self.check_depth(ty, depth);
        let data = self.db.lookup(ty);
        let TypeData::Simple {
            constructor,
            arguments,
            nullable,
        } = data
        else {
            return Ok(self.db.canonical(ty));
        };
        if arguments.is_empty() {
            return Ok(self.db.canonical(ty));
        }

        let info = self.db.constructor(constructor);
        assert_eq!(
            info.parameters.len(),
            arguments.len(),
            "argument count mismatch for {}",
            TypeFormatter::new(self.db).format(ty)
        );

        let mut new_arguments = Vec::with_capacity(arguments.len());
        for (argument, &parameter) in arguments.iter().zip(&info.parameters) {
            new_arguments.push(self.substitute_in_projection(*argument, parameter, context, depth + 1)?);
        }
        Ok(self.db.simple(constructor, &new_arguments, nullable))
    }

    fn substitute_in_projection(
        &self,
        passed: TypeProjection,
        parameter: ConstructorId,
        context: Variance,
        depth: u32,
    ) -> SubstitutionResult<TypeProjection> {
        let data = self.db.lookup(passed.ty);
        let TypeData::Simple {
            constructor,
            nullable,
            ..
        } = data
        else {
            return Ok(passed);
        };

        let parameter_variance = self.db.constructor(parameter).variance();
        let effective_kind = passed.kind.asymmetric_or(parameter_variance);
        let effective_context = context.superpose(effective_kind);

        if let Some(value) = self.value_with_nullability(constructor, nullable) {
            if !parameter_variance.allows(passed.kind) {
                return Ok(star_projection(self.db, parameter));
            }
            return self.substitution_result(parameter, effective_context, passed.kind, value, depth);
        }

        let specialized = self.specialize(passed.ty, effective_context, depth)?;
        Ok(TypeProjection::new(passed.kind, specialized))
    }

    /// Reconcile a replacement `value` against the context variance.
    fn substitution_result(
        &self,
        parameter: ConstructorId,
        context: Variance,
        passed_kind: Variance,
        value: TypeProjection,
        depth: u32,
    ) -> SubstitutionResult<TypeProjection> {
        let mut kind = passed_kind.asymmetric_or(value.kind);
        let ty = match context {
            Variance::Invariant => {
                kind = value.kind;
                value.ty
            }
            Variance::In => {
                if value.kind == Variance::Out {
                    let fmt = TypeFormatter::new(self.db);
                    return Err(SubstitutionConflict {
                        message: format!(
                            "out-projected {} cannot be used in an in-position of {}",
                            fmt.format_projection(value),
                            fmt.format_constructor(parameter)
                        ),
                    });
                }
                value.ty
            }
            Variance::Out => {
                if value.kind == Variance::In {
                    kind = Variance::Invariant;
                    upper_bounds_as_type(self.db, parameter)
                } else {
                    value.ty
                }
            }
        };

        let specialized = self.specialize(ty, context, depth + 1)?;
        Ok(TypeProjection::new(kind, specialized))
    }
}

#[cfg(test)]
#[path = "tests/substitution_tests.rs"]
mod tests;
