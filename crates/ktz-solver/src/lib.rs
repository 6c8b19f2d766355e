//! Nominal Type Solver
//!
//! Answers subtyping, equality, least-common-supertype and intersection
//! questions over a nominal type system with declaration-site and use-site
//! variance, nullable types and a bottom type.
//!
//! - **Interning**: every type is an interned `TypeId`, so equality of
//!   structurally equal types is an integer comparison
//! - **Constructors**: classes, interfaces, type parameters and
//!   intersections share one `ConstructorStore`
//! - **Substitution**: arguments are bound on demand, supertypes and members
//!   are never copied per instantiation
//! - **Bounded recursion**: self-referencing hierarchies terminate through
//!   depth limits instead of cycle detection
//!
//! Every algorithm takes `&dyn TypeDatabase`; [`TypeInterner`] is the one
//! implementation and owns a whole session.
mod builtins;
pub mod bounds;
pub mod common_supertype;
mod constructors;
pub mod decl;
mod deferred;
pub mod dfs;
pub mod diagnostics;
mod format;
mod intern;
pub mod intersect;
pub mod numbers;
pub mod recursion;
pub mod scope;
pub mod substitution;
pub mod subtype;
pub mod type_utils;
pub mod types;
pub mod variance;

pub use builtins::BuiltIns;
pub use bounds::{bounds_substitutor, sort_by_bound_dependencies, substitute_bounds};
pub use common_supertype::{CommonSupertypeSolver, common_supertype};
pub use constructors::{ConstructorInfo, ConstructorStore, TypeParamInfo};
pub use decl::{DeclError, DeclarationFile, Declarations};
pub use deferred::DeferredError;
pub use diagnostics::{
    ArgumentDirection, DiagnosticTracer, FastTracer, SubtypeFailureReason, SubtypeTracer,
};
pub use format::TypeFormatter;
pub use intern::{TypeDatabase, TypeInterner};
pub use intersect::{intersect, intersection_members, may_be_equal};
pub use numbers::{
    NumberLiteral, common_supertype_for_number_types, default_primitive_number_type,
    filter_number_types, is_number_value_type, number_value_type, primitive_number_type,
};
pub use scope::{MemberScope, member_scope};
pub use substitution::{Substitution, SubstitutionConflict, TypeSubstitutor};
pub use subtype::{SubtypeChecker, equal_types, explain_failure, is_subtype_of};
pub use types::{ConstructorId, ConstructorKind, DeferredId, TypeData, TypeId, TypeProjection};
pub use variance::Variance;

// Unit tests are loaded by their source files via #[path = "tests/..."].
// Cross-module scenarios live in the crate's tests/ directory.
#[cfg(test)]
#[path = "../tests/fixtures.rs"]
mod fixtures;
#[cfg(test)]
#[path = "../tests/type_checker_tests.rs"]
mod type_checker_tests;
#[cfg(test)]
#[path = "../tests/common_supertype_scenarios.rs"]
mod common_supertype_scenarios;
#[cfg(test)]
#[path = "../tests/type_law_tests.rs"]
mod type_law_tests;
#[cfg(test)]
#[path = "../tests/concurrency_tests.rs"]
mod concurrency_tests;
