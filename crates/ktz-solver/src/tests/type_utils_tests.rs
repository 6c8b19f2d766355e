use super::*;
use crate::decl::{DeclarationFile, Declarations};
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;

const DECLS: &str = r#"{
  "classes": [
    { "name": "Base", "open": true, "type_parameters": [{ "name": "T" }] },
    { "name": "Derived", "type_parameters": [{ "name": "T" }], "supertypes": ["Base<T>"] },
    { "name": "Final", "type_parameters": [{ "name": "T", "bounds": ["Number"] }] },
    { "name": "FinalOut", "type_parameters": [{ "name": "T", "variance": "out" }] },
    { "name": "Multi", "type_parameters": [{ "name": "T", "bounds": ["Comparable<T>", "CharSequence"] }] },
    { "name": "Pinned", "type_parameters": [{ "name": "T", "bounds": ["Int"] }] },
    { "name": "Nested", "type_parameters": [{ "name": "A" }, { "name": "B" }] }
  ]
}"#;

fn setup() -> (TypeInterner, Declarations) {
    let db = TypeInterner::new();
    let decls = Declarations::load(&db, &DeclarationFile::from_json(DECLS).unwrap()).unwrap();
    (db, decls)
}

fn parse(db: &TypeInterner, decls: &Declarations, text: &str) -> TypeId {
    decls.parse_type(db, text).unwrap()
}

fn param(db: &TypeInterner, decls: &Declarations, class: &str, name: &str) -> ConstructorId {
    decls.parameter(decls.class(db, class).unwrap(), name).unwrap()
}

#[test]
fn test_nullability_helpers() {
    let (db, decls) = setup();
    let int = parse(&db, &decls, "Int");
    let nullable_int = parse(&db, &decls, "Int?");
    assert_eq!(make_nullable(&db, int), nullable_int);
    assert_eq!(make_not_nullable(&db, nullable_int), int);
    assert_eq!(make_nullable_as_specified(&db, int, false), int);
    assert_eq!(make_nullable_if_needed(&db, nullable_int, false), nullable_int);
    assert_eq!(make_nullable_if_needed(&db, int, true), nullable_int);

    let error = db.error_type("oops");
    assert_eq!(make_nullable(&db, error), error);
}

#[test]
fn test_default_type_and_substitute_parameters() {
    let (db, decls) = setup();
    let nested = decls.class(&db, "Nested").unwrap();
    let fmt = TypeFormatter::new(&db);
    assert_eq!(fmt.format(default_type(&db, nested)), "Nested<A, B>");

    let applied = substitute_parameters(
        &db,
        nested,
        &[parse(&db, &decls, "Int"), parse(&db, &decls, "String?")],
    );
    assert_eq!(applied, parse(&db, &decls, "Nested<Int, String?>"));

    let projected = substitute_projections_for_parameters(
        &db,
        nested,
        &[
            TypeProjection::out(parse(&db, &decls, "Int")),
            TypeProjection::contra(parse(&db, &decls, "Any")),
        ],
    );
    assert_eq!(fmt.format(projected), "Nested<out Int, in Any>");
}

#[test]
#[should_panic(expected = "type parameter counts do not match")]
fn test_substitute_parameters_checks_arity() {
    let (db, decls) = setup();
    let nested = decls.class(&db, "Nested").unwrap();
    let _ = substitute_parameters(&db, nested, &[parse(&db, &decls, "Int")]);
}

#[test]
fn test_upper_bounds_and_star_projection() {
    let (db, decls) = setup();
    let fmt = TypeFormatter::new(&db);

    let base_t = param(&db, &decls, "Base", "T");
    assert_eq!(upper_bounds_as_type(&db, base_t), db.builtins().nullable_any);
    assert_eq!(star_projection(&db, base_t), TypeProjection::out(db.builtins().nullable_any));

    let final_t = param(&db, &decls, "Final", "T");
    assert_eq!(fmt.format(upper_bounds_as_type(&db, final_t)), "Number");

    let multi_t = param(&db, &decls, "Multi", "T");
    assert_eq!(
        fmt.format(upper_bounds_as_type(&db, multi_t)),
        "{Comparable<T> & CharSequence}"
    );
}

#[test]
fn test_supertype_walks() {
    let (db, decls) = setup();
    let derived = parse(&db, &decls, "Derived<Int>");
    assert_eq!(immediate_supertypes(&db, derived), vec![parse(&db, &decls, "Base<Int>")]);

    let all: Vec<_> = all_supertypes(&db, derived).into_iter().collect();
    assert_eq!(
        all,
        vec![parse(&db, &decls, "Base<Int>"), db.builtins().any_type]
    );
    assert!(all_supertypes(&db, db.builtins().any_type).is_empty());
}

#[test]
fn test_nullable_supertypes_of_parameters() {
    let (db, decls) = setup();
    let base_t = db.simple(param(&db, &decls, "Base", "T"), &[], false);
    let final_t = db.simple(param(&db, &decls, "Final", "T"), &[], false);
    assert!(has_nullable_super_type(&db, base_t));
    assert!(!has_nullable_super_type(&db, final_t));
    assert!(!has_nullable_super_type(&db, parse(&db, &decls, "Int")));
}

#[test]
fn test_equal_classes() {
    let (db, decls) = setup();
    assert!(equal_classes(
        &db,
        parse(&db, &decls, "Base<Int>"),
        parse(&db, &decls, "Base<out String>?")
    ));
    assert!(!equal_classes(
        &db,
        parse(&db, &decls, "Base<Int>"),
        parse(&db, &decls, "Derived<Int>")
    ));
}

#[test]
fn test_dependency_queries() {
    let (db, decls) = setup();
    let a = param(&db, &decls, "Nested", "A");
    let b = param(&db, &decls, "Nested", "B");
    let a_type = db.simple(a, &[], true);
    let base = decls.class(&db, "Base").unwrap();
    let base_of_a = db.simple(base, &[TypeProjection::invariant(a_type)], false);

    assert!(type_constructor_used_in_type(&db, a, base_of_a));
    assert!(type_constructor_used_in_type(&db, base, base_of_a));
    assert!(!type_constructor_used_in_type(&db, b, base_of_a));
    assert!(depends_on_type_parameters(&db, base_of_a, &[a, b]));
    assert!(!depends_on_type_parameters(&db, base_of_a, &[b]));

    let candidates = [a_type];
    assert!(equals_or_contains_as_argument(&db, base_of_a, &candidates));
    assert!(!equals_or_contains_as_argument(&db, parse(&db, &decls, "Base<Int>"), &candidates));
}

#[test]
fn test_type_depth() {
    let (db, decls) = setup();
    assert_eq!(type_depth(&db, parse(&db, &decls, "Int")), 1);
    assert_eq!(type_depth(&db, parse(&db, &decls, "Base<Base<Int>>")), 3);
    assert_eq!(
        max_type_depth(
            &db,
            [parse(&db, &decls, "Int"), parse(&db, &decls, "Nested<Int, Base<Int>>")]
        ),
        3
    );
    assert_eq!(max_type_depth(&db, []), 0);
}

#[test]
fn test_can_have_subtypes() {
    let (db, decls) = setup();
    let can = |text: &str| can_have_subtypes(&db, parse(&db, &decls, text));

    assert!(!can("Int"));
    assert!(can("Int?"));
    assert!(can("Number"));
    assert!(can("Base<Int>"));

    // Int sits strictly below the Any? bound of T.
    assert!(can("Derived<Int>"));
    assert!(!can("Derived<out Int>"));
    assert!(can("Derived<in Int>"));
    assert!(can("Final<Int>"));
    assert!(can("Final<Number>"));

    assert!(!can("Pinned<Int>"));
    assert!(can("FinalOut<Number>"));
    assert!(!can("FinalOut<Int>"));
}

#[test]
fn test_intersection_emptiness() {
    let (db, decls) = setup();
    assert!(is_intersection_empty(
        &db,
        parse(&db, &decls, "Int"),
        parse(&db, &decls, "String")
    ));
    assert!(!is_intersection_empty(
        &db,
        parse(&db, &decls, "Number"),
        parse(&db, &decls, "CharSequence")
    ));
}
