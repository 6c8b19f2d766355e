//! Declaration-site and use-site variance.
//!
//! A single enum serves both roles: the variance declared on a type
//! parameter (`class Box<out T>`) and the projection kind written at a use
//! site (`Box<in Number>`). Substitution composes the two through
//! [`Variance::superpose`] and [`Variance::asymmetric_or`].
//!
//! ## Composition
//!
//! When a projection sits inside a context, an explicit context wins and an
//! invariant context passes the inner kind through:
//!
//! | outer / inner | invariant | in        | out       |
//! |---------------|-----------|-----------|-----------|
//! | invariant     | invariant | in        | out       |
//! | in            | in        | in        | in        |
//! | out           | out       | out       | out       |

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variance {
    #[default]
    Invariant,
    In,
    Out,
}

impl Variance {
    /// Label used in source notation (`""`, `"in"`, `"out"`).
    pub const fn label(self) -> &'static str {
        match self {
            Variance::Invariant => "",
            Variance::In => "in",
            Variance::Out => "out",
        }
    }

    /// A value of this variance may be written into the position.
    #[inline]
    pub const fn allows_in_position(self) -> bool {
        matches!(self, Variance::In | Variance::Invariant)
    }

    /// A value of this variance may be read out of the position.
    #[inline]
    pub const fn allows_out_position(self) -> bool {
        matches!(self, Variance::Out | Variance::Invariant)
    }

    /// Variance of a position of kind `inner` nested inside a context of
    /// kind `self`.
    #[inline]
    pub const fn superpose(self, inner: Variance) -> Variance {
        match self {
            Variance::Invariant => inner,
            _ => self,
        }
    }

    /// `other` when `self` is invariant, otherwise `self`.
    ///
    /// Used to let an explicit use-site projection win over the declared
    /// variance of the parameter it is written against.
    #[inline]
    pub const fn asymmetric_or(self, other: Variance) -> Variance {
        match self {
            Variance::Invariant => other,
            _ => self,
        }
    }

    /// Whether a parameter declared with `self` may be used with the
    /// use-site projection `passed` without losing soundness.
    #[inline]
    pub const fn allows(self, passed: Variance) -> bool {
        match self {
            Variance::Invariant => true,
            Variance::In => !matches!(passed, Variance::Out),
            Variance::Out => !matches!(passed, Variance::In),
        }
    }

    /// Variance of the opposite direction.
    pub const fn opposite(self) -> Variance {
        match self {
            Variance::Invariant => Variance::Invariant,
            Variance::In => Variance::Out,
            Variance::Out => Variance::In,
        }
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[path = "tests/variance_tests.rs"]
mod tests;
