use super::*;
use crate::types::ConstructorKind;

#[test]
fn test_structural_deduplication() {
    let interner = TypeInterner::new();
    let b = interner.builtins();
    let first = interner.simple(b.comparable, &[TypeProjection::invariant(b.int_type)], false);
    let second = interner.simple(b.comparable, &[TypeProjection::invariant(b.int_type)], false);
    let nullable = interner.simple(b.comparable, &[TypeProjection::invariant(b.int_type)], true);
    let projected = interner.simple(b.comparable, &[TypeProjection::contra(b.int_type)], false);

    assert_eq!(first, second);
    assert_ne!(first, nullable);
    assert_ne!(first, projected);
}

#[test]
fn test_builtins_are_registered() {
    let interner = TypeInterner::new();
    let b = interner.builtins();
    assert_eq!(interner.constructor_of(b.int_type), b.int);
    assert!(interner.is_nullable(b.nullable_any));
    assert!(!interner.is_nullable(b.any_type));
    assert!(interner.is_nothing(b.nothing_type));
    assert!(interner.is_nothing(b.nullable_nothing));
    assert_eq!(
        interner.constructors().get_kind(b.comparable),
        Some(ConstructorKind::Interface)
    );
    assert_eq!(b.by_name("Char"), Some(b.char));
    assert_eq!(b.by_name("Object"), None);
}

#[test]
fn test_sessions_are_independent() {
    let first = TypeInterner::new();
    let second = TypeInterner::new();
    let extra = first
        .constructors()
        .register(ConstructorInfo::class(first.intern_string("Extra"), true));
    assert!(first.constructors().contains(extra));
    assert!(!second.constructors().contains(extra));
}

#[test]
fn test_error_types() {
    let interner = TypeInterner::new();
    let error = interner.error_type("cannot infer");
    assert!(interner.is_error(error));
    assert!(!interner.is_nullable(error));
    assert_eq!(interner.constructor_of(error), interner.builtins().error);
    assert_eq!(interner.error_type("cannot infer"), error);
    assert_ne!(interner.error_type("something else"), error);
}

#[test]
fn test_ids_encode_shard() {
    let interner = TypeInterner::new();
    let before = interner.type_count();
    let b = interner.builtins();
    let ty = interner.simple(b.comparable, &[TypeProjection::out(b.string_type)], true);
    assert_eq!(interner.type_count(), before + 1);
    assert_eq!(interner.lookup_raw(ty), Some(interner.lookup(ty)));
    assert_eq!(interner.lookup_raw(TypeId(u32::MAX)), None);
}

#[test]
fn test_canonical_follows_deferred_chains() {
    let interner = TypeInterner::new();
    let int = interner.builtins().int_type;
    let inner = interner.deferred(move |_| int);
    let outer = interner.deferred(move |_| inner);
    assert_eq!(interner.canonical(outer), int);
    assert_eq!(interner.canonical(int), int);
}

#[test]
#[should_panic(expected = "was not interned in this session")]
fn test_lookup_of_foreign_id_panics() {
    let interner = TypeInterner::new();
    let _ = interner.lookup(TypeId(u32::MAX));
}
