//! Command-line front end for the ktz type engine.
//!
//! The engine itself lives in `ktz-solver`; this crate loads a declaration
//! file into a session, answers queries against it and sets up tracing.

pub mod query;
pub mod tracing_config;
