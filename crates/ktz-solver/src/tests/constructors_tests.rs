use super::*;
use crate::TypeInterner;
use crate::intern::TypeDatabase;

#[test]
fn test_constructor_id_validity() {
    assert!(!ConstructorId::INVALID.is_valid());
    assert!(ConstructorId(1).is_valid());
}

#[test]
fn test_register_and_get() {
    let interner = TypeInterner::new();
    let store = ConstructorStore::new();

    let name = interner.intern_string("Base_T");
    let id = store.register(ConstructorInfo::class(name, false));
    assert!(id.is_valid());
    assert!(store.contains(id));
    assert_eq!(store.get_kind(id), Some(ConstructorKind::Class));

    let info = store.get(id).expect("constructor exists");
    assert_eq!(info.name, name);
    assert!(!info.sealed);
    assert!(info.parameters.is_empty());
}

#[test]
fn test_two_phase_declaration() {
    let interner = TypeInterner::new();
    let store = ConstructorStore::new();
    let rec = store.register(ConstructorInfo::class(interner.intern_string("Rec"), false));
    let t = store.register(ConstructorInfo::type_parameter(
        interner.intern_string("T"),
        Variance::Out,
        rec,
        0,
    ));
    assert!(store.set_parameters(rec, vec![t]));

    let any = interner.builtins().nullable_any;
    assert!(store.set_supertypes(t, vec![any]));

    let rec_info = store.get(rec).expect("rec");
    assert_eq!(rec_info.parameters, vec![t]);
    let t_info = store.get(t).expect("t");
    assert!(t_info.is_type_parameter());
    assert_eq!(t_info.variance(), Variance::Out);
    assert_eq!(t_info.param.map(|p| p.owner), Some(rec));
    assert_eq!(t_info.supertypes, vec![any]);
}

#[test]
fn test_updates_on_missing_constructor_fail() {
    let store = ConstructorStore::new();
    assert!(!store.set_sealed(ConstructorId(42), true));
    assert!(!store.set_supertypes(ConstructorId(42), Vec::new()));
}

#[test]
fn test_add_member_replaces_existing() {
    let interner = TypeInterner::new();
    let store = ConstructorStore::new();
    let props = store.register(ConstructorInfo::class(interner.intern_string("Props"), true));
    let p = interner.intern_string("p");
    let b = interner.builtins();

    store.add_member(props, p, b.int_type);
    store.add_member(props, p, b.string_type);

    let info = store.get(props).expect("props");
    assert_eq!(info.members.len(), 1);
    assert_eq!(info.member(p), Some(b.string_type));
}

#[test]
fn test_intersection_constructors_are_shared() {
    let interner = TypeInterner::new();
    let store = ConstructorStore::new();
    let b = interner.builtins();

    let first = store.intersection(&[b.char_sequence_type, b.number_type]);
    let second = store.intersection(&[b.char_sequence_type, b.number_type]);
    let reversed = store.intersection(&[b.number_type, b.char_sequence_type]);

    assert_eq!(first, second);
    assert_ne!(first, reversed);
    let info = store.get(first).expect("intersection");
    assert_eq!(info.kind, ConstructorKind::Intersection);
    assert_eq!(info.supertypes, vec![b.char_sequence_type, b.number_type]);
}
