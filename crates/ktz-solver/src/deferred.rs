//! Lazily computed types.
//!
//! A deferred slot moves through a small state machine:
//!
//! ```text
//! Unevaluated ──first read──▶ Evaluating(thread) ──done──▶ Evaluated(TypeId)
//!                                     │
//!                                     └──compute panicked──▶ Failed
//! ```
//!
//! Readers on other threads block on a condition variable while the slot is
//! `Evaluating`, so the computation runs at most once. A read from the
//! computing thread itself is a cycle: it fails with
//! [`DeferredError::Reentrant`] unless the slot was created with a reentry
//! default.
//!
//! Cycles can also span threads: thread A computes `D1` and reads `D2`
//! while thread B computes `D2` and reads `D1`. The table keeps a wait-for
//! graph (slot to computing thread, thread to awaited slot) and a reader
//! about to block first follows it from the slot's owner. Reaching itself
//! means the wait would never end, so the read fails as reentrant instead.
//!
//! A computation that panics after one of its reads failed as reentrant is
//! reported as [`DeferredError::Reentrant`] too, and so is the computation
//! that read it, up the chain of computations on the same thread.

use crate::intern::TypeInterner;
use crate::types::{DeferredId, TypeId};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock};
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

pub(crate) type Compute = Box<dyn FnOnce(&TypeInterner) -> TypeId + Send>;

/// Failure to produce a deferred type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredError {
    /// The computation read its own result before finishing.
    Reentrant(DeferredId),
    /// An earlier computation of this slot panicked.
    Failed(DeferredId),
    /// No such slot in this session.
    Unknown(DeferredId),
}

impl fmt::Display for DeferredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredError::Reentrant(id) => {
                write!(f, "deferred type {} was read while being computed", id.0)
            }
            DeferredError::Failed(id) => write!(f, "computation of deferred type {} failed", id.0),
            DeferredError::Unknown(id) => write!(f, "deferred type {} does not exist", id.0),
        }
    }
}

impl std::error::Error for DeferredError {}

enum SlotState {
    Unevaluated(Compute),
    Evaluating(ThreadId),
    Evaluated(TypeId),
    /// `cyclic` when the computation failed on a reentrant read.
    Failed { cyclic: bool },
}

struct DeferredSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
    on_reentry: Option<TypeId>,
    reentered: AtomicBool,
}

impl DeferredSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn finish(&self, state: SlotState) {
        *self.lock() = state;
        self.ready.notify_all();
    }

    /// Answer a read that would wait on itself.
    fn reentered(&self, id: DeferredId) -> Result<TypeId, DeferredError> {
        if let Some(default) = self.on_reentry {
            debug!(deferred = id.0, "reentrant read answered with default");
            return Ok(default);
        }
        mark_current_reentered();
        Err(DeferredError::Reentrant(id))
    }
}

thread_local! {
    /// Slots being computed on this thread, innermost last.
    static COMPUTING: RefCell<Vec<Arc<DeferredSlot>>> = const { RefCell::new(Vec::new()) };
}

/// Flag the innermost computation on this thread as having hit a cycle.
fn mark_current_reentered() {
    COMPUTING.with_borrow(|stack| {
        if let Some(slot) = stack.last() {
            slot.reentered.store(true, Ordering::SeqCst);
        }
    });
}

/// Who computes which slot, and which slot each blocked thread awaits.
///
/// Always locked after a slot's state, never before.
#[derive(Default)]
struct WaitGraph {
    owners: FxHashMap<DeferredId, ThreadId>,
    waiting: FxHashMap<ThreadId, DeferredId>,
}

/// All deferred slots of a session.
pub(crate) struct DeferredTable {
    slots: RwLock<Vec<Arc<DeferredSlot>>>,
    graph: Mutex<WaitGraph>,
}

impl DeferredTable {
    pub(crate) fn new() -> Self {
        DeferredTable {
            slots: RwLock::new(Vec::new()),
            graph: Mutex::new(WaitGraph::default()),
        }
    }

    pub(crate) fn allocate(&self, compute: Compute, on_reentry: Option<TypeId>) -> DeferredId {
        let slot = Arc::new(DeferredSlot {
            state: Mutex::new(SlotState::Unevaluated(compute)),
            ready: Condvar::new(),
            on_reentry,
            reentered: AtomicBool::new(false),
        });
        let mut slots = match self.slots.write() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = DeferredId(slots.len() as u32);
        slots.push(slot);
        trace!(deferred = id.0, "DeferredTable::allocate");
        id
    }

    fn slot(&self, id: DeferredId) -> Option<Arc<DeferredSlot>> {
        let slots = self.slots.read().ok()?;
        slots.get(id.0 as usize).cloned()
    }

    pub(crate) fn is_computed(&self, id: DeferredId) -> bool {
        self.slot(id)
            .is_some_and(|slot| matches!(*slot.lock(), SlotState::Evaluated(_)))
    }

    fn graph(&self) -> MutexGuard<'_, WaitGraph> {
        match self.graph.lock() {
            Ok(graph) => graph,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Whether `me` waiting for `awaited` (computed by `owner`) closes a
    /// cycle. If not, the wait is recorded.
    fn closes_cycle(&self, me: ThreadId, owner: ThreadId, awaited: DeferredId) -> bool {
        let mut graph = self.graph();
        let mut thread = owner;
        // Each step visits a distinct blocked thread unless there is a cycle.
        for _ in 0..=graph.waiting.len() {
            if thread == me {
                return true;
            }
            let Some(&next) = graph
                .waiting
                .get(&thread)
                .and_then(|slot| graph.owners.get(slot))
            else {
                break;
            };
            thread = next;
        }
        graph.waiting.insert(me, awaited);
        false
    }

    /// Produce the type of slot `id`, computing it if needed.
    pub(crate) fn force(
        &self,
        id: DeferredId,
        interner: &TypeInterner,
    ) -> Result<TypeId, DeferredError> {
        let slot = self.slot(id).ok_or(DeferredError::Unknown(id))?;
        let me = thread::current().id();

        let compute = {
            let mut state = slot.lock();
            loop {
                let owner = match &*state {
                    SlotState::Evaluated(ty) => return Ok(*ty),
                    SlotState::Failed { cyclic } => {
                        if *cyclic {
                            mark_current_reentered();
                        }
                        return Err(DeferredError::Failed(id));
                    }
                    SlotState::Evaluating(owner) if *owner == me => return slot.reentered(id),
                    SlotState::Evaluating(owner) => *owner,
                    SlotState::Unevaluated(_) => break,
                };
                if self.closes_cycle(me, owner, id) {
                    debug!(deferred = id.0, "deferred types wait on each other across threads");
                    return slot.reentered(id);
                }
                state = match slot.ready.wait(state) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                self.graph().waiting.remove(&me);
            }
            let SlotState::Unevaluated(compute) = std::mem::replace(&mut *state, SlotState::Evaluating(me))
            else {
                unreachable!("slot state changed under lock");
            };
            self.graph().owners.insert(id, me);
            compute
        };

        trace!(deferred = id.0, "computing deferred type");
        COMPUTING.with_borrow_mut(|stack| stack.push(Arc::clone(&slot)));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| compute(interner)));
        COMPUTING.with_borrow_mut(|stack| stack.pop());
        self.graph().owners.remove(&id);

        match outcome {
            Ok(ty) => {
                slot.finish(SlotState::Evaluated(ty));
                Ok(ty)
            }
            Err(payload) => {
                let cyclic = slot.reentered.load(Ordering::SeqCst);
                slot.finish(SlotState::Failed { cyclic });
                if cyclic {
                    debug!(deferred = id.0, "deferred computation depends on itself");
                    mark_current_reentered();
                    Err(DeferredError::Reentrant(id))
                } else {
                    panic::resume_unwind(payload)
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/deferred_tests.rs"]
mod tests;
