//! Explaining subtype failures.
//!
//! ## Tracer Pattern
//!
//! The subtype checker is written once against [`SubtypeTracer`] and used in
//! two modes:
//!
//! - **FastTracer**: returns `false` on the first mismatch without building
//!   a reason. The closure passed to `on_mismatch` is never called.
//! - **DiagnosticTracer**: records the first [`SubtypeFailureReason`] so the
//!   caller can say *why* `sub <: sup` does not hold.
//!
//! Reasons are plain data holding `TypeId`s. Rendering to text happens only
//! when a reason is displayed, through [`SubtypeFailureReason::render`].

use crate::format::TypeFormatter;
use crate::intern::TypeDatabase;
use crate::types::TypeId;
use serde::Serialize;

// =============================================================================
// Tracers
// =============================================================================

pub trait SubtypeTracer {
    /// Called when a mismatch is detected.
    ///
    /// Returns `true` if checking should continue, `false` to stop.
    fn on_mismatch(&mut self, reason: impl FnOnce() -> SubtypeFailureReason) -> bool;
}

/// Boolean-only tracer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastTracer;

impl SubtypeTracer for FastTracer {
    #[inline(always)]
    fn on_mismatch(&mut self, _reason: impl FnOnce() -> SubtypeFailureReason) -> bool {
        false
    }
}

/// Tracer that keeps the first failure reason.
#[derive(Debug, Default)]
pub struct DiagnosticTracer {
    failure: Option<SubtypeFailureReason>,
}

impl DiagnosticTracer {
    pub fn new() -> Self {
        Self { failure: None }
    }

    pub fn take_failure(&mut self) -> Option<SubtypeFailureReason> {
        self.failure.take()
    }

    pub fn get_failure(&self) -> Option<&SubtypeFailureReason> {
        self.failure.as_ref()
    }

    pub fn has_failure(&self) -> bool {
        self.failure.is_some()
    }
}

impl SubtypeTracer for DiagnosticTracer {
    #[inline]
    fn on_mismatch(&mut self, reason: impl FnOnce() -> SubtypeFailureReason) -> bool {
        // Later mismatches are consequences of the first one.
        if self.failure.is_none() {
            self.failure = Some(reason());
        }
        false
    }
}

// =============================================================================
// Failure reasons
// =============================================================================

/// Which side of an argument comparison failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentDirection {
    /// `subOut <: superOut` did not hold.
    Out,
    /// `superIn <: subIn` did not hold.
    In,
}

/// Why `sub <: sup` does not hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubtypeFailureReason {
    /// A nullable type was checked against a non-null one.
    NullabilityMismatch { sub: TypeId, sup: TypeId },

    /// `sup`'s constructor is not among `sub`'s supertypes.
    NoCorrespondingSupertype { sub: TypeId, sup: TypeId },

    /// The corresponding supertype was found but argument `index` differs.
    ArgumentMismatch {
        sub: TypeId,
        sup: TypeId,
        index: usize,
        direction: ArgumentDirection,
        nested_reason: Option<Box<SubtypeFailureReason>>,
    },

    /// The depth limit was hit before an answer was reached.
    DepthExceeded { sub: TypeId, sup: TypeId },

    /// Generic mismatch with no more specific explanation.
    TypeMismatch { sub: TypeId, sup: TypeId },
}

impl SubtypeFailureReason {
    /// Pair of types this reason is about.
    pub fn types(&self) -> (TypeId, TypeId) {
        match self {
            SubtypeFailureReason::NullabilityMismatch { sub, sup }
            | SubtypeFailureReason::NoCorrespondingSupertype { sub, sup }
            | SubtypeFailureReason::ArgumentMismatch { sub, sup, .. }
            | SubtypeFailureReason::DepthExceeded { sub, sup }
            | SubtypeFailureReason::TypeMismatch { sub, sup } => (*sub, *sup),
        }
    }

    /// Multi-line explanation, innermost cause last.
    pub fn render(&self, db: &dyn TypeDatabase) -> String {
        let fmt = TypeFormatter::new(db);
        let mut lines = Vec::new();
        let mut current = Some(self);
        let mut indent = 0usize;
        while let Some(reason) = current {
            let (sub, sup) = reason.types();
            let (sub, sup) = (fmt.format(sub), fmt.format(sup));
            let pad = "  ".repeat(indent);
            let (line, next) = match reason {
                SubtypeFailureReason::NullabilityMismatch { .. } => (
                    format!("{pad}{sub} is nullable but {sup} is not"),
                    None,
                ),
                SubtypeFailureReason::NoCorrespondingSupertype { .. } => (
                    format!("{pad}{sub} has no supertype with the constructor of {sup}"),
                    None,
                ),
                SubtypeFailureReason::ArgumentMismatch {
                    index,
                    direction,
                    nested_reason,
                    ..
                } => {
                    let side = match direction {
                        ArgumentDirection::Out => "upper",
                        ArgumentDirection::In => "lower",
                    };
                    (
                        format!("{pad}type argument #{index} of {sub} does not fit {sup} ({side} bound)"),
                        nested_reason.as_deref(),
                    )
                }
                SubtypeFailureReason::DepthExceeded { .. } => (
                    format!("{pad}gave up comparing {sub} with {sup}: nesting too deep"),
                    None,
                ),
                SubtypeFailureReason::TypeMismatch { .. } => {
                    (format!("{pad}{sub} is not a subtype of {sup}"), None)
                }
            };
            lines.push(line);
            current = next;
            indent += 1;
        }
        lines.join("\n")
    }
}
