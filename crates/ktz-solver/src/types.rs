//! Type representation.
//!
//! Types are interned: every structurally distinct [`TypeData`] value is
//! stored once in the [`TypeInterner`](crate::TypeInterner) and referred to
//! through a [`TypeId`] handle. Two handles are equal exactly when the
//! underlying data is equal, which gives O(1) syntactic identity. Semantic
//! equality is a different question answered by
//! [`equal_types`](crate::equal_types).
//!
//! ## Shape of a type
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `Simple` | A constructor applied to projections, plus a nullability flag |
//! | `Error` | The absorbing error marker, carrying a diagnostic message |
//! | `Deferred` | A lazily computed type, resolved on every structural read |
//!
//! The member scope of a type is not stored in the type itself. It is
//! derived on demand from the constructor and the argument bindings (see
//! [`member_scope`](crate::member_scope)).

use crate::variance::Variance;
use ktz_common::interner::Atom;
use serde::Serialize;
use smallvec::SmallVec;

// =============================================================================
// Handles
// =============================================================================

/// Handle to an interned type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

/// Handle to a type constructor in the [`ConstructorStore`](crate::ConstructorStore).
///
/// Constructor identity is declaration identity: two classes with the same
/// name declared twice are two different constructors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstructorId(pub u32);

impl ConstructorId {
    /// Sentinel value for an unallocated constructor.
    pub const INVALID: Self = Self(0);

    /// First id handed out by a store.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a lazily computed type slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeferredId(pub u32);

// =============================================================================
// Projections
// =============================================================================

/// One actual type argument together with its use-site variance.
///
/// `Box<in Number>` has a single projection `{ kind: In, ty: Number }`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TypeProjection {
    pub kind: Variance,
    pub ty: TypeId,
}

impl TypeProjection {
    #[inline]
    pub const fn new(kind: Variance, ty: TypeId) -> Self {
        Self { kind, ty }
    }

    /// Projection without a use-site annotation.
    #[inline]
    pub const fn invariant(ty: TypeId) -> Self {
        Self::new(Variance::Invariant, ty)
    }

    #[inline]
    pub const fn out(ty: TypeId) -> Self {
        Self::new(Variance::Out, ty)
    }

    #[inline]
    pub const fn contra(ty: TypeId) -> Self {
        Self::new(Variance::In, ty)
    }
}

/// Argument list of a type. Most types have at most two arguments.
pub type ProjectionList = SmallVec<[TypeProjection; 2]>;

// =============================================================================
// TypeData
// =============================================================================

/// Structural content of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// `constructor<arguments>` with an optional `?`.
    Simple {
        constructor: ConstructorId,
        arguments: ProjectionList,
        nullable: bool,
    },
    /// Absorbing error marker. Every predicate involving it succeeds.
    Error { message: Atom },
    /// Lazily computed type.
    Deferred(DeferredId),
}

impl TypeData {
    /// Build a simple type from its parts.
    pub fn simple(
        constructor: ConstructorId,
        arguments: impl IntoIterator<Item = TypeProjection>,
        nullable: bool,
    ) -> Self {
        TypeData::Simple {
            constructor,
            arguments: arguments.into_iter().collect(),
            nullable,
        }
    }

    pub fn constructor(&self) -> Option<ConstructorId> {
        match self {
            TypeData::Simple { constructor, .. } => Some(*constructor),
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[TypeProjection] {
        match self {
            TypeData::Simple { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// Nullability flag. Error types report `false`.
    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeData::Simple { nullable: true, .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeData::Error { .. })
    }
}

// =============================================================================
// Constructor kinds
// =============================================================================

/// Kind of type constructor.
///
/// | Kind | Has parameters | Supertypes mean |
/// |------|----------------|-----------------|
/// | Class | Yes | Declared superclass and interfaces |
/// | Interface | Yes | Declared super-interfaces |
/// | TypeParameter | No | Upper bounds |
/// | Intersection | No | The intersected members |
/// | NumberValue | No | Primitive number types able to hold the literal |
/// | Error | No | Nothing |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ConstructorKind {
    Class,
    Interface,
    TypeParameter,
    Intersection,
    /// Type of a number literal before an expected type picks one
    /// primitive number type.
    NumberValue,
    Error,
}

impl ConstructorKind {
    pub const fn is_classifier(self) -> bool {
        matches!(self, ConstructorKind::Class | ConstructorKind::Interface)
    }
}
