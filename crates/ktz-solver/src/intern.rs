//! Type interning and the session database.
//!
//! [`TypeInterner`] owns everything a type-checking session needs:
//!
//! - the sharded type table (structural deduplication of [`TypeData`])
//! - the string pool for names and error messages
//! - the [`ConstructorStore`]
//! - the deferred-type slots
//! - the session's [`BuiltIns`]
//!
//! Algorithms never take a `TypeInterner` directly; they are written against
//! the object-safe [`TypeDatabase`] trait and receive `&dyn TypeDatabase`.
//!
//! ## Sharding
//!
//! The type table is split into `SHARD_COUNT` independently locked buckets.
//! A `TypeId` packs the shard index into its low `SHARD_BITS` bits and the
//! index inside the shard into the rest, so resolving an id never needs a
//! global lock.

use crate::builtins::BuiltIns;
use crate::constructors::{ConstructorInfo, ConstructorStore};
use crate::deferred::{DeferredError, DeferredTable};
use crate::types::{ConstructorId, DeferredId, TypeData, TypeId, TypeProjection};
use ktz_common::interner::{Atom, ShardedInterner};
use ktz_common::limits::{SHARD_BITS, SHARD_COUNT, SHARD_MASK};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};
use tracing::trace;

// =============================================================================
// TypeDatabase
// =============================================================================

/// Read/write access to interned types, shared by every algorithm.
pub trait TypeDatabase: Sync {
    /// Intern `data`, returning the existing id for equal data.
    fn intern(&self, data: TypeData) -> TypeId;

    /// Structural content of `id` with deferred types resolved.
    ///
    /// # Panics
    ///
    /// If a deferred type fails to compute. Use
    /// [`TypeInterner::force`] to observe the failure instead.
    fn lookup(&self, id: TypeId) -> TypeData;

    /// `id` with deferred indirections removed.
    fn canonical(&self, id: TypeId) -> TypeId;

    /// Constructor info for `id`.
    ///
    /// # Panics
    ///
    /// If `id` was never registered; algorithms only meet constructors that
    /// appear in interned types.
    fn constructor(&self, id: ConstructorId) -> Arc<ConstructorInfo>;

    fn constructors(&self) -> &ConstructorStore;

    fn builtins(&self) -> &BuiltIns;

    fn intern_string(&self, s: &str) -> Atom;

    fn resolve_atom(&self, atom: Atom) -> Arc<str>;

    // -------------------------------------------------------------------------
    // Convenience constructors
    // -------------------------------------------------------------------------

    /// Intern `constructor<arguments>` with the given nullability.
    fn simple(
        &self,
        constructor: ConstructorId,
        arguments: &[TypeProjection],
        nullable: bool,
    ) -> TypeId {
        self.intern(TypeData::simple(
            constructor,
            arguments.iter().copied(),
            nullable,
        ))
    }

    /// Error type carrying `message`.
    fn error_type(&self, message: &str) -> TypeId {
        self.intern(TypeData::Error {
            message: self.intern_string(message),
        })
    }

    fn is_error(&self, id: TypeId) -> bool {
        self.lookup(id).is_error()
    }

    fn is_nullable(&self, id: TypeId) -> bool {
        self.lookup(id).is_nullable()
    }

    /// `Nothing` or `Nothing?`.
    fn is_nothing(&self, id: TypeId) -> bool {
        self.lookup(id).constructor() == Some(self.builtins().nothing)
    }

    /// Constructor of a type. Error types answer the shared error
    /// constructor.
    fn constructor_of(&self, id: TypeId) -> ConstructorId {
        self.lookup(id)
            .constructor()
            .unwrap_or(self.builtins().error)
    }
}

// =============================================================================
// TypeTable
// =============================================================================

#[derive(Default)]
struct TypeShardState {
    map: FxHashMap<TypeData, TypeId>,
    types: Vec<TypeData>,
}

/// Sharded structural deduplication of [`TypeData`].
pub(crate) struct TypeTable {
    shards: [RwLock<TypeShardState>; SHARD_COUNT],
}

impl TypeTable {
    fn new() -> Self {
        TypeTable {
            shards: std::array::from_fn(|_| RwLock::new(TypeShardState::default())),
        }
    }

    #[inline]
    fn shard_for(data: &TypeData) -> usize {
        let mut hasher = FxHasher::default();
        data.hash(&mut hasher);
        (hasher.finish() as usize) & SHARD_MASK
    }

    pub(crate) fn intern(&self, data: TypeData) -> TypeId {
        let shard_idx = Self::shard_for(&data);
        let shard = &self.shards[shard_idx];

        if let Ok(state) = shard.read() {
            if let Some(&id) = state.map.get(&data) {
                return id;
            }
        }

        let mut state = match shard.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(&id) = state.map.get(&data) {
            return id;
        }
        let local_index = state.types.len() as u32;
        assert!(
            local_index <= (u32::MAX >> SHARD_BITS),
            "type table shard {shard_idx} is full"
        );
        let id = TypeId((local_index << SHARD_BITS) | shard_idx as u32);
        state.types.push(data.clone());
        state.map.insert(data, id);
        id
    }

    fn get(&self, id: TypeId) -> Option<TypeData> {
        let shard_idx = (id.0 & SHARD_MASK as u32) as usize;
        let local_index = (id.0 >> SHARD_BITS) as usize;
        let state = self.shards.get(shard_idx)?.read().ok()?;
        state.types.get(local_index).cloned()
    }

    fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().map(|s| s.types.len()).unwrap_or(0))
            .sum()
    }
}

// =============================================================================
// TypeInterner
// =============================================================================

/// A type-checking session.
pub struct TypeInterner {
    types: TypeTable,
    strings: ShardedInterner,
    store: ConstructorStore,
    deferred: DeferredTable,
    builtins: BuiltIns,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    /// Create a session with the built-in classes declared.
    pub fn new() -> Self {
        let types = TypeTable::new();
        let strings = ShardedInterner::new();
        let store = ConstructorStore::new();
        let builtins = BuiltIns::declare(&types, &strings, &store);
        trace!(
            constructors = store.len(),
            types = types.len(),
            "TypeInterner::new"
        );
        TypeInterner {
            types,
            strings,
            store,
            deferred: DeferredTable::new(),
            builtins,
        }
    }

    /// Raw content of `id` without resolving deferred types.
    pub fn lookup_raw(&self, id: TypeId) -> Option<TypeData> {
        self.types.get(id)
    }

    /// Number of distinct interned types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // -------------------------------------------------------------------------
    // Deferred types
    // -------------------------------------------------------------------------

    /// Allocate a lazily computed type.
    ///
    /// `compute` runs at most once, on the first thread that reads the type.
    /// Reading the type again from inside `compute` is a reentrancy failure.
    pub fn deferred(
        &self,
        compute: impl FnOnce(&TypeInterner) -> TypeId + Send + 'static,
    ) -> TypeId {
        let id = self.deferred.allocate(Box::new(compute), None);
        self.types.intern(TypeData::Deferred(id))
    }

    /// Like [`deferred`](Self::deferred), but a reentrant read answers
    /// `on_reentry` instead of failing.
    pub fn deferred_with_reentry_default(
        &self,
        compute: impl FnOnce(&TypeInterner) -> TypeId + Send + 'static,
        on_reentry: TypeId,
    ) -> TypeId {
        let id = self
            .deferred
            .allocate(Box::new(compute), Some(on_reentry));
        self.types.intern(TypeData::Deferred(id))
    }

    /// Resolve `id` through any chain of deferred types, reporting failures.
    pub fn force(&self, id: TypeId) -> Result<TypeId, DeferredError> {
        let mut current = id;
        loop {
            match self.types.get(current) {
                Some(TypeData::Deferred(slot)) => {
                    current = self.deferred.force(slot, self)?;
                }
                _ => return Ok(current),
            }
        }
    }

    /// Whether a deferred slot has already produced its type.
    pub fn is_computed(&self, id: DeferredId) -> bool {
        self.deferred.is_computed(id)
    }
}

impl TypeDatabase for TypeInterner {
    fn intern(&self, data: TypeData) -> TypeId {
        self.types.intern(data)
    }

    fn lookup(&self, id: TypeId) -> TypeData {
        let resolved = self.canonical(id);
        match self.types.get(resolved) {
            Some(data) => data,
            None => panic!("type {id:?} was not interned in this session"),
        }
    }

    fn canonical(&self, id: TypeId) -> TypeId {
        match self.force(id) {
            Ok(resolved) => resolved,
            Err(err) => panic!("failed to resolve deferred type {id:?}: {err}"),
        }
    }

    fn constructor(&self, id: ConstructorId) -> Arc<ConstructorInfo> {
        match self.store.get(id) {
            Some(info) => info,
            None => panic!("constructor {id:?} is not registered in this session"),
        }
    }

    fn constructors(&self) -> &ConstructorStore {
        &self.store
    }

    fn builtins(&self) -> &BuiltIns {
        &self.builtins
    }

    fn intern_string(&self, s: &str) -> Atom {
        self.strings.intern(s)
    }

    fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.strings.resolve(atom)
    }
}

#[cfg(test)]
#[path = "tests/intern_tests.rs"]
mod tests;
