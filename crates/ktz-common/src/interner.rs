//! Names used by the type engine.
//!
//! Class names, parameter names, member names and error messages are stored
//! once per session and referred to by [`Atom`]. An atom packs the shard that
//! owns the string together with the string's slot in that shard:
//!
//! ```text
//! Atom(u32) = slot << SHARD_BITS | shard
//! ```
//!
//! The empty string is always `Atom::NONE`.

use crate::limits::{SHARD_BITS, SHARD_COUNT, SHARD_MASK};
use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Atom(pub u32);

impl Atom {
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    fn pack(shard: usize, slot: usize) -> Option<Atom> {
        let slot = u32::try_from(slot).ok().filter(|&s| s <= u32::MAX >> SHARD_BITS)?;
        Some(Atom((slot << SHARD_BITS) | shard as u32))
    }

    #[inline]
    fn unpack(self) -> (usize, usize) {
        ((self.0 as usize) & SHARD_MASK, (self.0 >> SHARD_BITS) as usize)
    }
}

#[derive(Default)]
struct NameShard {
    slots: FxHashMap<Arc<str>, Atom>,
    names: Vec<Arc<str>>,
}

/// Concurrent string pool split into `SHARD_COUNT` independently locked
/// shards. A name always lands in the shard chosen by its hash.
pub struct ShardedInterner {
    shards: Box<[RwLock<NameShard>]>,
}

impl ShardedInterner {
    pub fn new() -> Self {
        let shards: Box<[RwLock<NameShard>]> =
            (0..SHARD_COUNT).map(|_| RwLock::default()).collect();
        {
            // Slot 0 of shard 0 is Atom::NONE.
            let mut first = shards[0].write().unwrap_or_else(PoisonError::into_inner);
            let empty: Arc<str> = Arc::from("");
            first.names.push(empty.clone());
            first.slots.insert(empty, Atom::NONE);
        }
        Self { shards }
    }

    /// Atom for `s`, adding it to the pool on first use.
    ///
    /// # Panics
    ///
    /// If a shard runs out of slots.
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }
        let index = shard_of(s);
        let shard = &self.shards[index];
        if let Some(&atom) = shard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .get(s)
        {
            return atom;
        }

        let mut shard = shard.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(&atom) = shard.slots.get(s) {
            return atom;
        }
        let Some(atom) = Atom::pack(index, shard.names.len()) else {
            panic!("name pool shard {index} is full");
        };
        let name: Arc<str> = Arc::from(s);
        shard.names.push(name.clone());
        shard.slots.insert(name, atom);
        atom
    }

    /// The string behind `atom`; empty for an atom from another pool.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let (index, slot) = atom.unpack();
        let shard = self.shards.get(index)?.read().unwrap_or_else(PoisonError::into_inner);
        shard.names.get(slot).cloned()
    }

    /// Number of stored names, the empty string included.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner).names.len())
            .sum()
    }

    /// Whether nothing beyond the empty string was interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for ShardedInterner {
    fn default() -> Self {
        Self::new()
    }
}

fn shard_of(s: &str) -> usize {
    let mut hasher = FxHasher::default();
    s.hash(&mut hasher);
    (hasher.finish() as usize) & SHARD_MASK
}

#[cfg(test)]
#[path = "tests/interner_tests.rs"]
mod tests;
