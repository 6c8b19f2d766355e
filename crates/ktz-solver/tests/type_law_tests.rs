//! Algebraic properties every well-formed hierarchy must satisfy.

use crate::fixtures::Fixture;
use crate::type_utils::make_nullable;
use crate::{
    Substitution, TypeDatabase, TypeProjection, TypeSubstitutor, Variance, common_supertype,
    equal_types, is_subtype_of,
};
use rustc_hash::FxHashMap;

const SAMPLE: &[&str] = &[
    "Any",
    "Any?",
    "Int",
    "Int?",
    "String",
    "Comparable<Int>",
    "Comparable<in Int>",
    "Base_T<Int>",
    "Base_T<out Any?>",
    "Base_T<in Int>?",
    "Derived_T<Int>",
    "Base_outT<Int>",
    "Base_inT<Any>",
    "MDerived_T<String>",
    "ArrayList<Int>",
    "List<Int?>",
    "Rec<ARec>",
    "ARec",
];

const ZOO: &str = r#"{
  "classes": [
    { "name": "Animal", "open": true },
    { "name": "Dog", "supertypes": ["Animal"] },
    { "name": "Cat", "supertypes": ["Animal"] },
    { "name": "Collection", "kind": "interface", "type_parameters": [{ "name": "E", "variance": "out" }] },
    { "name": "List", "kind": "interface", "type_parameters": [{ "name": "E", "variance": "out" }],
      "supertypes": ["Collection<E>"] },
    { "name": "Set", "kind": "interface", "type_parameters": [{ "name": "E", "variance": "out" }],
      "supertypes": ["Collection<E>"] },
    { "name": "Box", "type_parameters": [{ "name": "T", "variance": "out", "bounds": ["Any"] }] },
    { "name": "Foo", "type_parameters": [{ "name": "T" }] }
  ]
}"#;

#[test]
fn test_reflexivity() {
    let f = Fixture::new();
    for text in SAMPLE {
        let ty = f.ty(text);
        assert!(is_subtype_of(f.db(), ty, ty), "{text} <: {text}");
        assert!(equal_types(f.db(), ty, ty), "{text} == {text}");
    }
}

#[test]
fn test_nullable_is_not_below_non_null() {
    let f = Fixture::new();
    for text in SAMPLE {
        let ty = f.ty(text);
        let nullable = make_nullable(f.db(), ty);
        assert!(is_subtype_of(f.db(), ty, nullable));
        if !f.db().is_nullable(ty) {
            assert!(!is_subtype_of(f.db(), nullable, ty), "{text}? <: {text}");
        }
    }
}

#[test]
fn test_bottom_type() {
    let f = Fixture::new();
    let b = f.db().builtins();
    for text in SAMPLE {
        let ty = f.ty(text);
        assert!(is_subtype_of(f.db(), b.nothing_type, ty));
        assert_eq!(
            is_subtype_of(f.db(), b.nullable_nothing, ty),
            f.db().is_nullable(ty),
            "Nothing? against {text}"
        );
    }
}

#[test]
fn test_error_absorption() {
    let f = Fixture::new();
    let error = f.db().error_type("unresolved reference");
    for text in SAMPLE {
        let ty = f.ty(text);
        assert!(is_subtype_of(f.db(), error, ty));
        assert!(is_subtype_of(f.db(), ty, error));
    }
}

#[test]
fn test_transitivity_on_sample() {
    let f = Fixture::new();
    let types: Vec<_> = SAMPLE.iter().map(|t| f.ty(t)).collect();
    for &a in &types {
        for &b in &types {
            if !is_subtype_of(f.db(), a, b) {
                continue;
            }
            for &c in &types {
                if is_subtype_of(f.db(), b, c) {
                    assert!(
                        is_subtype_of(f.db(), a, c),
                        "{} <: {} <: {}",
                        f.show(a),
                        f.show(b),
                        f.show(c)
                    );
                }
            }
        }
    }
}

#[test]
fn test_empty_substitution_is_identity() {
    let f = Fixture::new();
    let substitutor = TypeSubstitutor::empty(f.db());
    for text in SAMPLE {
        let ty = f.ty(text);
        for variance in [Variance::Invariant, Variance::In, Variance::Out] {
            assert_eq!(substitutor.substitute(ty, variance), Some(ty));
        }
    }
}

#[test]
fn test_substitution_on_closed_types_is_identity() {
    let f = Fixture::new();
    let db = f.db();
    let base_t = f.decls.class(db, "Base_T").expect("Base_T");
    let t = f.decls.parameter(base_t, "T").expect("T");
    let substitutor = TypeSubstitutor::new(
        db,
        Substitution::from_map(FxHashMap::from_iter([(t, TypeProjection::invariant(f.ty("String")))])),
    );
    for text in SAMPLE {
        let ty = f.ty(text);
        let result = substitutor.safe_substitute(ty, Variance::Invariant);
        assert!(equal_types(db, result, ty), "{text} changed to {}", f.show(result));
    }
}

#[test]
fn test_variance_aware_substitution() {
    let f = Fixture::with_source(ZOO);
    let db = f.db();
    let boxed = f.decls.class(db, "Box").expect("Box");
    let t = f.decls.parameter(boxed, "T").expect("T");
    let t_type = db.simple(t, &[], false);

    let to_number = TypeSubstitutor::new(
        db,
        Substitution::from_map(FxHashMap::from_iter([(t, TypeProjection::invariant(f.ty("Number")))])),
    );
    let box_of_t = db.simple(boxed, &[TypeProjection::invariant(t_type)], false);
    let result = to_number.safe_substitute(box_of_t, Variance::Invariant);
    assert_eq!(f.show(result), "Box<Number>");

    let to_in_number = TypeSubstitutor::new(
        db,
        Substitution::from_map(FxHashMap::from_iter([(t, TypeProjection::contra(f.ty("Number")))])),
    );
    let widened = to_in_number.safe_substitute(t_type, Variance::Out);
    assert_eq!(f.show(widened), "Any");
}

#[test]
fn test_common_supertype_diamond() {
    let f = Fixture::with_source(ZOO);
    let cs = common_supertype(f.db(), &[f.ty("Dog"), f.ty("Cat")]);
    assert!(equal_types(f.db(), cs, f.ty("Animal")));
}

#[test]
fn test_common_supertype_with_generics() {
    let f = Fixture::with_source(ZOO);
    let cs = common_supertype(f.db(), &[f.ty("List<Int>"), f.ty("Set<Int>")]);
    assert!(
        equal_types(f.db(), cs, f.ty("Collection<Int>")),
        "got {}",
        f.show(cs)
    );
}

#[test]
fn test_common_supertype_nullability() {
    let f = Fixture::new();
    let cs = common_supertype(f.db(), &[f.ty("Int"), f.ty("String?")]);
    assert!(f.db().is_nullable(cs));
    assert!(is_subtype_of(f.db(), f.ty("Int"), cs));
    assert!(is_subtype_of(f.db(), f.ty("String?"), cs));
}

#[test]
fn test_common_supertype_of_singleton() {
    let f = Fixture::new();
    for text in SAMPLE {
        let ty = f.ty(text);
        assert_eq!(common_supertype(f.db(), &[ty]), ty);
    }
}

#[test]
#[should_panic(expected = "immediate recursion in substitution")]
fn test_self_referencing_substitution_is_rejected() {
    let f = Fixture::with_source(ZOO);
    let db = f.db();
    let foo = f.decls.class(db, "Foo").expect("Foo");
    let t = f.decls.parameter(foo, "T").expect("T");
    let foo_of_t = db.simple(foo, &[TypeProjection::invariant(db.simple(t, &[], false))], false);
    let _ = TypeSubstitutor::new(
        db,
        Substitution::from_map(FxHashMap::from_iter([(t, TypeProjection::invariant(foo_of_t))])),
    );
}

#[test]
fn test_equality_via_subtyping() {
    let f = Fixture::new();
    let pairs = [
        ("Base_outT<out Int>", "Base_outT<Int>"),
        ("Base_inT<in Int>", "Base_inT<Int>"),
        ("Base_T<*>", "Base_T<out Any?>"),
    ];
    for (a, b) in pairs {
        let (a_ty, b_ty) = (f.ty(a), f.ty(b));
        assert!(equal_types(f.db(), a_ty, b_ty), "{a} == {b}");
    }
    assert_ne!(f.ty("Base_outT<out Int>"), f.ty("Base_outT<Int>"));
}

#[test]
fn test_make_nullable_leaves_errors_alone() {
    let f = Fixture::new();
    let error = f.db().error_type("broken");
    assert_eq!(make_nullable(f.db(), error), error);
}
