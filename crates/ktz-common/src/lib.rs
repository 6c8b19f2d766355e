//! Common types and utilities for the ktz type engine.
//!
//! This crate provides foundational pieces shared by the solver and the driver:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Engine limits and thresholds

// String interning for declaration and parameter names
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Centralized limits and thresholds
pub mod limits;
