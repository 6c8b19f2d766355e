use crate::fixtures::Fixture;
use crate::type_utils::max_type_depth;
use crate::{CommonSupertypeSolver, TypeDatabase, TypeProjection, common_supertype, is_subtype_of};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

#[test]
fn test_recursive_hierarchy_is_cut_off() {
    let f = Fixture::new();
    let cs = common_supertype(f.db(), &[f.ty("ARec"), f.ty("BRec")]);
    assert_eq!(
        f.show(cs),
        "Rec<out Rec<out Rec<out Rec<out Rec<out Any?>>>>>"
    );
    assert!(is_subtype_of(f.db(), f.ty("ARec"), cs));
    assert!(is_subtype_of(f.db(), f.ty("BRec"), cs));
}

#[test]
fn test_single_type_is_returned() {
    let f = Fixture::new();
    let ty = f.ty("Base_T<out Int>");
    assert_eq!(common_supertype(f.db(), &[ty]), ty);
}

#[test]
fn test_nullability_is_or_ed() {
    let f = Fixture::new();
    let cs = common_supertype(f.db(), &[f.ty("Derived_T<Int>?"), f.ty("DDerived_T<Int>")]);
    assert_eq!(f.show(cs), "Derived_T<Int>?");
}

#[test]
fn test_errors_are_ignored_unless_alone() {
    let f = Fixture::new();
    let db = f.db();
    let error = db.error_type("unresolved");
    assert_eq!(common_supertype(db, &[f.ty("Int"), error]), f.ty("Int"));
    assert_eq!(common_supertype(db, &[error, error]), error);
}

#[test]
fn test_result_is_a_supertype_of_every_input() {
    let f = Fixture::new();
    let inputs = [
        ["Int", "String"],
        ["ArrayList<Int>", "AbstractList<String>"],
        ["DDerived_T<A>", "Derived_T<B>"],
        ["Base_outT<A>", "Derived_outT<B>"],
        ["Base_inT<A>", "Derived_inT<B>"],
    ];
    for pair in inputs {
        let types: Vec<_> = pair.iter().map(|t| f.ty(t)).collect();
        let cs = common_supertype(f.db(), &types);
        for &ty in &types {
            assert!(
                is_subtype_of(f.db(), ty, cs),
                "{} is not below {}",
                f.show(ty),
                f.show(cs)
            );
        }
    }
}

#[test]
fn test_declared_variance_shapes_projection() {
    let f = Fixture::new();
    let cs = common_supertype(f.db(), &[f.ty("Base_outT<A>"), f.ty("Base_outT<B>")]);
    assert_eq!(f.show(cs), "Base_outT<Parent>");

    let cs = common_supertype(f.db(), &[f.ty("Base_inT<A>"), f.ty("Base_inT<B>")]);
    assert_eq!(f.show(cs), "Base_inT<out Any?>");
}

#[test]
fn test_projection_at_depth_limit() {
    let f = Fixture::new();
    let db = f.db();
    let types = [f.ty("Base_T<A>"), f.ty("Base_T<B>")];
    let max_depth = max_type_depth(db, types);
    let solver = CommonSupertypeSolver::new(db, max_depth);

    let parameter = db.constructor(f.decls.class(db, "Base_T").expect("declared")).parameters[0];
    let projections: IndexSet<TypeProjection, FxBuildHasher> = [
        TypeProjection::invariant(f.ty("A")),
        TypeProjection::invariant(f.ty("B")),
    ]
    .into_iter()
    .collect();

    let cut = solver.supertype_projection(parameter, &projections, max_depth);
    assert_eq!(cut, TypeProjection::out(db.builtins().nullable_any));

    let open = solver.supertype_projection(parameter, &projections, 0);
    assert_eq!(open, TypeProjection::out(f.ty("Parent")));
}
