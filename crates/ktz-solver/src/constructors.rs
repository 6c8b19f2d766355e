//! Type constructors and their storage.
//!
//! A constructor is the nominal "shape" of a type: its declared parameters,
//! its declared direct supertypes, whether it is sealed and which members it
//! declares. Constructors are referenced by [`ConstructorId`] and live in a
//! [`ConstructorStore`].
//!
//! ## Two-phase declaration
//!
//! F-bounded parameters (`T : Comparable<T>`) and self-referencing
//! hierarchies (`class ARec : Rec<ARec>`) cannot be written down in a single
//! step, because the supertype mentions the constructor being declared. The
//! store therefore hands out an id first and lets the declaration layer fill
//! in supertypes, bounds and members afterwards:
//!
//! ```ignore
//! let rec = store.register(ConstructorInfo::class(name, false));
//! let t = store.register(ConstructorInfo::type_parameter(t_name, Variance::Invariant, rec, 0));
//! store.set_parameters(rec, vec![t]);
//! // ... intern `Rec<ARec>` ...
//! store.set_supertypes(a_rec, vec![rec_of_a_rec]);
//! ```
//!
//! Once declaration completes the algorithms only read from the store.
//!
//! ## Type parameters
//!
//! A type parameter is itself a constructor of kind
//! [`ConstructorKind::TypeParameter`]. Its upper bounds are stored as its
//! supertypes, so supertype traversal naturally walks from `T` to its
//! bounds.

use crate::types::{ConstructorId, ConstructorKind, TypeId};
use crate::variance::Variance;
use dashmap::DashMap;
use ktz_common::interner::Atom;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::trace;

/// Counter for telling store instances apart in traces.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// ConstructorInfo
// =============================================================================

/// Declaration-site data of a type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeParamInfo {
    /// Constructor that declares the parameter.
    pub owner: ConstructorId,
    /// Position in the owner's parameter list.
    pub index: u32,
    pub variance: Variance,
}

/// Everything known about one constructor.
#[derive(Clone, Debug)]
pub struct ConstructorInfo {
    pub kind: ConstructorKind,

    /// Display name. Intersections have no name.
    pub name: Atom,

    /// Type-parameter constructors, in declaration order.
    pub parameters: Vec<ConstructorId>,

    /// Declared direct supertypes. For a type parameter these are its upper
    /// bounds; for an intersection, its members.
    pub supertypes: Vec<TypeId>,

    /// Closed for extension (a final class).
    pub sealed: bool,

    /// Declared members, name to unsubstituted type.
    pub members: Vec<(Atom, TypeId)>,

    /// Present for type-parameter constructors only.
    pub param: Option<TypeParamInfo>,
}

impl ConstructorInfo {
    fn base(kind: ConstructorKind, name: Atom) -> Self {
        Self {
            kind,
            name,
            parameters: Vec::new(),
            supertypes: Vec::new(),
            sealed: false,
            members: Vec::new(),
            param: None,
        }
    }

    /// A class. `sealed` is true for final classes.
    pub fn class(name: Atom, sealed: bool) -> Self {
        Self {
            sealed,
            ..Self::base(ConstructorKind::Class, name)
        }
    }

    /// An interface. Interfaces are never sealed.
    pub fn interface(name: Atom) -> Self {
        Self::base(ConstructorKind::Interface, name)
    }

    /// A type parameter declared by `owner` at position `index`.
    pub fn type_parameter(
        name: Atom,
        variance: Variance,
        owner: ConstructorId,
        index: u32,
    ) -> Self {
        Self {
            param: Some(TypeParamInfo {
                owner,
                index,
                variance,
            }),
            ..Self::base(ConstructorKind::TypeParameter, name)
        }
    }

    /// Synthetic constructor of an intersection of `members`.
    pub fn intersection(members: Vec<TypeId>) -> Self {
        Self {
            supertypes: members,
            ..Self::base(ConstructorKind::Intersection, Atom::NONE)
        }
    }

    /// Constructor of a number literal named by the literal itself.
    /// `primitives` are the number types that can represent its value.
    pub fn number_value(name: Atom, primitives: Vec<TypeId>) -> Self {
        Self {
            supertypes: primitives,
            sealed: true,
            ..Self::base(ConstructorKind::NumberValue, name)
        }
    }

    /// Constructor shared by all error types.
    pub fn error(name: Atom) -> Self {
        Self {
            sealed: true,
            ..Self::base(ConstructorKind::Error, name)
        }
    }

    /// Set the parameter list.
    pub fn with_parameters(mut self, parameters: Vec<ConstructorId>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the declared supertypes.
    pub fn with_supertypes(mut self, supertypes: Vec<TypeId>) -> Self {
        self.supertypes = supertypes;
        self
    }

    pub fn is_type_parameter(&self) -> bool {
        self.kind == ConstructorKind::TypeParameter
    }

    /// Declared variance of a type parameter. Invariant for other kinds.
    pub fn variance(&self) -> Variance {
        self.param.map_or(Variance::Invariant, |p| p.variance)
    }

    /// Look up a member declared directly on this constructor.
    pub fn member(&self, name: Atom) -> Option<TypeId> {
        self.members
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
    }
}

// =============================================================================
// ConstructorStore
// =============================================================================

type IntersectionKey = SmallVec<[TypeId; 4]>;

/// Thread-safe storage for constructors.
///
/// Uses `DashMap` so that declaration loading and concurrent readers do not
/// contend on a single lock.
pub struct ConstructorStore {
    instance_id: u64,
    constructors: DashMap<ConstructorId, Arc<ConstructorInfo>>,
    intersections: DashMap<IntersectionKey, ConstructorId>,
    number_values: DashMap<Atom, ConstructorId>,
    next_id: AtomicU32,
}

impl Default for ConstructorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructorStore {
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(instance_id, "ConstructorStore::new");
        Self {
            instance_id,
            constructors: DashMap::new(),
            intersections: DashMap::new(),
            number_values: DashMap::new(),
            next_id: AtomicU32::new(ConstructorId::FIRST_VALID),
        }
    }

    fn allocate(&self) -> ConstructorId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        ConstructorId(id)
    }

    /// Register a constructor and return its id.
    pub fn register(&self, info: ConstructorInfo) -> ConstructorId {
        let id = self.allocate();
        trace!(
            instance_id = self.instance_id,
            constructor = id.0,
            kind = ?info.kind,
            "ConstructorStore::register"
        );
        self.constructors.insert(id, Arc::new(info));
        id
    }

    pub fn get(&self, id: ConstructorId) -> Option<Arc<ConstructorInfo>> {
        self.constructors.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, id: ConstructorId) -> bool {
        self.constructors.contains_key(&id)
    }

    pub fn get_kind(&self, id: ConstructorId) -> Option<ConstructorKind> {
        self.constructors.get(&id).map(|r| r.kind)
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Upper limit (exclusive) of the ids handed out so far.
    pub fn id_bound(&self) -> usize {
        self.next_id.load(Ordering::SeqCst) as usize
    }

    fn update(&self, id: ConstructorId, f: impl FnOnce(&mut ConstructorInfo)) -> bool {
        match self.constructors.get_mut(&id) {
            Some(mut entry) => {
                f(Arc::make_mut(entry.value_mut()));
                true
            }
            None => false,
        }
    }

    /// Set the parameter list of a class or interface.
    pub fn set_parameters(&self, id: ConstructorId, parameters: Vec<ConstructorId>) -> bool {
        self.update(id, |info| info.parameters = parameters)
    }

    /// Set declared supertypes (upper bounds for a type parameter).
    pub fn set_supertypes(&self, id: ConstructorId, supertypes: Vec<TypeId>) -> bool {
        trace!(
            instance_id = self.instance_id,
            constructor = id.0,
            count = supertypes.len(),
            "ConstructorStore::set_supertypes"
        );
        self.update(id, |info| info.supertypes = supertypes)
    }

    pub fn set_sealed(&self, id: ConstructorId, sealed: bool) -> bool {
        self.update(id, |info| info.sealed = sealed)
    }

    /// Declare a member, replacing an earlier declaration of the same name.
    pub fn add_member(&self, id: ConstructorId, name: Atom, ty: TypeId) -> bool {
        self.update(id, |info| {
            if let Some(slot) = info.members.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = ty;
            } else {
                info.members.push((name, ty));
            }
        })
    }

    /// Constructor for the intersection of `members`.
    ///
    /// Equal member lists share one constructor, so two intersections of the
    /// same types intern to the same `TypeId`.
    pub fn intersection(&self, members: &[TypeId]) -> ConstructorId {
        let key: IntersectionKey = members.iter().copied().collect();
        if let Some(existing) = self.intersections.get(&key) {
            return *existing;
        }
        *self
            .intersections
            .entry(key)
            .or_insert_with(|| self.register(ConstructorInfo::intersection(members.to_vec())))
    }

    /// Constructor of the number literal spelled `name`. The same literal
    /// always gets the same constructor; `primitives` is only read the
    /// first time.
    pub fn number_value(&self, name: Atom, primitives: impl FnOnce() -> Vec<TypeId>) -> ConstructorId {
        if let Some(existing) = self.number_values.get(&name) {
            return *existing;
        }
        *self
            .number_values
            .entry(name)
            .or_insert_with(|| self.register(ConstructorInfo::number_value(name, primitives())))
    }
}

#[cfg(test)]
#[path = "tests/constructors_tests.rs"]
mod tests;
