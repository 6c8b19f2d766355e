use super::*;
use crate::decl::Declarations;
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;

fn setup() -> (TypeInterner, Declarations) {
    (TypeInterner::new(), Declarations::default())
}

fn supertypes(db: &TypeInterner, ty: TypeId) -> String {
    let primitives = db.constructor(db.constructor_of(ty)).supertypes.clone();
    TypeFormatter::new(db).format_list(&primitives)
}

#[test]
fn test_literal_supertypes_follow_value_range() {
    let db = TypeInterner::new();
    let int = |v| number_value_type(&db, NumberLiteral::Integer(v));

    assert_eq!(supertypes(&db, int(1)), "Int, Byte, Short, Long");
    assert_eq!(supertypes(&db, int(200)), "Int, Short, Long");
    assert_eq!(supertypes(&db, int(-40_000)), "Int, Long");
    assert_eq!(supertypes(&db, int(3_000_000_000)), "Long");
    assert_eq!(
        supertypes(&db, number_value_type(&db, NumberLiteral::Floating(1.5))),
        "Double, Float"
    );
}

#[test]
fn test_equal_literals_share_a_type() {
    let db = TypeInterner::new();
    let a = number_value_type(&db, NumberLiteral::Integer(7));
    let b = number_value_type(&db, NumberLiteral::Integer(7));
    let c = number_value_type(&db, NumberLiteral::Floating(7.0));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(TypeFormatter::new(&db).format(a), "7");
    assert_eq!(TypeFormatter::new(&db).format(c), "7.0");
    assert!(is_number_value_type(&db, a));
    assert!(!is_number_value_type(&db, db.builtins().int_type));
}

#[test]
fn test_default_primitive_number_type() {
    let db = TypeInterner::new();
    let b = db.builtins().clone();
    let of = |literal| default_primitive_number_type(&db, number_value_type(&db, literal));
    assert_eq!(of(NumberLiteral::Integer(1)), b.int_type);
    assert_eq!(of(NumberLiteral::Integer(3_000_000_000)), b.long_type);
    assert_eq!(of(NumberLiteral::Floating(0.5)), b.double_type);
}

#[test]
fn test_primitive_number_type_follows_expectation() {
    let (db, decls) = setup();
    let ty = |text: &str| decls.parse_type(&db, text).unwrap();
    let one = ty("1");

    assert_eq!(primitive_number_type(&db, one, None), ty("Int"));
    assert_eq!(primitive_number_type(&db, one, Some(ty("Long"))), ty("Long"));
    assert_eq!(primitive_number_type(&db, one, Some(ty("Short?"))), ty("Short"));
    assert_eq!(primitive_number_type(&db, one, Some(ty("Number"))), ty("Int"));
    assert_eq!(primitive_number_type(&db, one, Some(ty("String"))), ty("Int"));
    assert_eq!(primitive_number_type(&db, one, Some(db.error_type("?"))), ty("Int"));
    assert_eq!(primitive_number_type(&db, ty("2.5"), Some(ty("Float"))), ty("Float"));
}

#[test]
fn test_filter_number_types() {
    let (db, decls) = setup();
    let ty = |text: &str| decls.parse_type(&db, text).unwrap();
    let (others, numbers) = filter_number_types(&db, &[ty("1"), ty("String"), ty("2"), ty("1"), ty("Int")]);
    assert_eq!(others, vec![ty("String"), ty("Int")]);
    assert_eq!(numbers, vec![ty("1"), ty("2")]);
}

#[test]
fn test_common_supertype_for_number_types() {
    let (db, decls) = setup();
    let ty = |text: &str| decls.parse_type(&db, text).unwrap();
    let join = |texts: &[&str]| {
        let types: Vec<_> = texts.iter().map(|t| ty(t)).collect();
        common_supertype_for_number_types(&db, &types).map(|t| TypeFormatter::new(&db).format(t))
    };

    assert_eq!(join(&[]), None);
    assert_eq!(join(&["1", "200"]), Some("Int".to_string()));
    assert_eq!(join(&["1", "3000000000"]), Some("Long".to_string()));
    assert_eq!(join(&["1.5", "2.5"]), Some("Double".to_string()));
    // No shared primitive: the default types are joined.
    assert_eq!(join(&["1", "1.5"]), Some("Any".to_string()));
}

#[test]
fn test_literals_in_common_supertype_and_subtyping() {
    let (db, decls) = setup();
    let ty = |text: &str| decls.parse_type(&db, text).unwrap();
    let cs = |texts: &[&str]| {
        let types: Vec<_> = texts.iter().map(|t| ty(t)).collect();
        TypeFormatter::new(&db).format(common_supertype(&db, &types))
    };

    assert_eq!(cs(&["1", "200"]), "Int");
    assert_eq!(cs(&["1", "200?"]), "Int?");
    assert_eq!(cs(&["1", "Nothing", "3000000000"]), "Long");
    assert_eq!(cs(&["1"]), "1");

    assert!(is_subtype_of(&db, ty("1"), ty("Byte")));
    assert!(!is_subtype_of(&db, ty("200"), ty("Byte")));
    assert!(is_subtype_of(&db, ty("1.5"), ty("Number")));
    assert!(!is_subtype_of(&db, ty("Int"), ty("1")));
}

#[test]
fn test_reader_rejects_malformed_literals() {
    let (db, decls) = setup();
    assert!(decls.parse_type(&db, "1.2.3").is_err());
    assert!(decls.parse_type(&db, "99999999999999999999").is_err());
    assert_eq!(TypeFormatter::new(&db).format(decls.parse_type(&db, "-1_000").unwrap()), "-1000");
}
