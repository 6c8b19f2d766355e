//! Centralized limits and thresholds for the type engine.
//!
//! Every recursive algorithm in the solver walks a type graph that was built
//! outside of it. A malformed graph (a substitution that feeds itself, a
//! hierarchy whose arguments keep growing) would otherwise recurse forever, so
//! each walk is bounded by one of the constants below.
//!
//! # Categories
//!
//! - **Fatal ceilings**: exceeding them means the input graph is broken and the
//!   operation aborts with a panic.
//! - **Cut-offs**: exceeding them is expected for self-referential hierarchies;
//!   the algorithm answers conservatively and continues.
//! - **Sharding**: sizing for the concurrent interners.

// =============================================================================
// Fatal ceilings
// =============================================================================

/// Maximum nesting of recursive substitution calls.
///
/// Substitution re-specializes every replacement it inserts, so a pair of
/// bindings that mention each other (`T -> Foo<U>`, `U -> Bar<T>`) never
/// bottoms out. Reaching this depth is an internal-consistency violation and
/// the substitutor panics with the offending type and substitution.
///
/// ```kotlin
/// // T := Foo<U>, U := Bar<T>
/// // Foo<U> -> Foo<Bar<T>> -> Foo<Bar<Foo<U>>> -> ...
/// ```
pub const MAX_SUBSTITUTION_DEPTH: u32 = 100;

// =============================================================================
// Cut-offs
// =============================================================================

/// Maximum depth of nested subtype checks.
///
/// Argument comparison may fall back to a parameter's upper bound, and an
/// F-bounded parameter (`T : Comparable<T>`) can lead the checker back into the
/// same question. Past this depth the pair is reported as unrelated.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Extra levels granted to common-supertype argument reconstruction on top of
/// the deepest input type.
///
/// ```kotlin
/// class Rec<T>
/// class ARec : Rec<ARec>
/// class BRec : Rec<BRec>
/// // commonSupertype(ARec, BRec) = Rec<out Rec<out Rec<out Rec<out Rec<out Any?>>>>>
/// ```
pub const COMMON_SUPERTYPE_EXTRA_DEPTH: u32 = 3;

/// Red zone for on-demand stack growth in deep recursive walks.
pub const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each stack segment allocated when the red zone is reached.
pub const STACK_GROWTH_SIZE: usize = 1024 * 1024;

// =============================================================================
// Sharding
// =============================================================================

/// Number of bits used for shard selection in concurrent interners.
///
/// ```text
/// hash(type_data) = 0b...101011_110010
///                          ^^^^^^
///                     shard index = lower 6 bits = 0b110010 = 50
/// ```
pub const SHARD_BITS: u32 = 6;

/// Number of shards (2^SHARD_BITS = 64).
pub const SHARD_COUNT: usize = 1 << SHARD_BITS;

/// Mask for extracting shard index (SHARD_COUNT - 1 = 63 = 0b111111).
pub const SHARD_MASK: usize = SHARD_COUNT - 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_constants_consistent() {
        assert_eq!(SHARD_COUNT, 1 << SHARD_BITS);
        assert_eq!(SHARD_MASK, SHARD_COUNT - 1);
    }

    #[test]
    fn test_fatal_ceiling_matches_subtype_cutoff() {
        assert_eq!(MAX_SUBSTITUTION_DEPTH, 100);
        assert!(COMMON_SUPERTYPE_EXTRA_DEPTH > 0);
        assert!(STACK_GROWTH_SIZE > STACK_RED_ZONE);
    }
}
