//! Depth limiting for recursive type computations.
//!
//! The type graph may be cyclic through supertypes (`class ARec : Rec<ARec>`)
//! and through deferred types, so every algorithm that recurses over it
//! carries a [`DepthCounter`]. Limits are named through
//! [`RecursionProfile`] rather than written as raw numbers at call sites:
//!
//! ```ignore
//! let mut depth = DepthCounter::with_profile(RecursionProfile::SubtypeCheck);
//! if !depth.enter() {
//!     return false;
//! }
//! let result = recurse();
//! depth.leave();
//! ```
//!
//! In debug builds, dropping a counter with unmatched `enter()` calls panics.

use ktz_common::limits::{MAX_SUBSTITUTION_DEPTH, MAX_SUBTYPE_DEPTH};

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Subtype and equality checks.
    ///
    /// depth = 100
    SubtypeCheck,

    /// Parameter substitution.
    ///
    /// depth = 100
    Substitution,

    /// Member lookup through supertypes.
    ///
    /// depth = 100
    MemberLookup,

    /// Caller-specified depth.
    Custom { max_depth: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            RecursionProfile::SubtypeCheck | RecursionProfile::MemberLookup => MAX_SUBTYPE_DEPTH,
            RecursionProfile::Substitution => MAX_SUBSTITUTION_DEPTH,
            RecursionProfile::Custom { max_depth } => max_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only guard. It does not track which keys are being visited, since
/// the same pair of types may legitimately be compared more than once on a
/// path.
#[derive(Debug)]
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Try to enter a deeper level.
    ///
    /// Returns `false` without incrementing once the limit is reached; do not
    /// call [`leave`](Self::leave) in that case.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leave the current level. Must match a successful [`enter`](Self::enter).
    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(
            self.depth > 0,
            "DepthCounter::leave() called at depth 0 without a matching enter()"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Sticky until [`reset`](Self::reset).
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn reset(&mut self) {
        self.depth = 0;
        self.exceeded = false;
    }
}

#[cfg(debug_assertions)]
impl Drop for DepthCounter {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!(
                "DepthCounter dropped at depth {}: enter() without matching leave()",
                self.depth
            );
        }
    }
}

#[cfg(test)]
#[path = "tests/recursion_tests.rs"]
mod tests;
