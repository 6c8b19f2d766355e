use super::*;
use std::io::Write;

const DECLS: &str = r#"{
  "classes": [
    { "name": "Animal", "open": true },
    { "name": "Dog", "supertypes": ["Animal"] },
    { "name": "Cat", "supertypes": ["Animal"] },
    { "name": "Box", "type_parameters": [{ "name": "T" }],
      "members": [{ "name": "value", "type": "T" }] },
    { "name": "Src", "type_parameters": [{ "name": "T", "variance": "out" }] }
  ]
}"#;

fn session() -> Session {
    Session::from_source(DECLS).unwrap()
}

fn ask(query: Query) -> Answer {
    session().answer(&query, true).unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_subtype_answers() {
    let answer = ask(Query::Subtype {
        sub: "Dog".into(),
        sup: "Animal".into(),
    });
    assert_eq!(answer.to_string(), "true");

    let answer = ask(Query::Subtype {
        sub: "Src<Animal>".into(),
        sup: "Src<Dog>".into(),
    });
    let Answer::Subtype { holds, reason, .. } = &answer else {
        panic!("unexpected answer {answer:?}");
    };
    assert!(!holds);
    assert!(matches!(reason, Some(SubtypeFailureReason::ArgumentMismatch { index: 0, .. })));
    assert_eq!(
        answer.to_string(),
        "false\n\
         type argument #0 of Src<Animal> does not fit Src<Dog> (upper bound)\n  \
         Animal has no supertype with the constructor of Dog"
    );
}

#[test]
fn test_subtype_without_explanation() {
    let answer = session()
        .answer(
            &Query::Subtype {
                sub: "Animal".into(),
                sup: "Dog".into(),
            },
            false,
        )
        .unwrap();
    assert_eq!(
        answer,
        Answer::Subtype {
            holds: false,
            reason: None,
            explanation: None,
        }
    );
}

#[test]
fn test_other_queries() {
    assert_eq!(
        ask(Query::Equal {
            a: "Src<out Dog>".into(),
            b: "Src<Dog>".into(),
        })
        .to_string(),
        "true"
    );
    assert_eq!(
        ask(Query::CommonSupertype {
            types: strings(&["Box<Dog>", "Box<Cat>?"]),
        })
        .to_string(),
        "Box<out Animal>?"
    );
    assert_eq!(
        ask(Query::Intersect {
            types: strings(&["Dog", "Cat"]),
        })
        .to_string(),
        "<empty>"
    );
    assert_eq!(
        ask(Query::Intersect {
            types: strings(&["Animal", "Dog?"]),
        })
        .to_string(),
        "Dog"
    );
    assert_eq!(
        ask(Query::Member {
            receiver: "Box<in Dog>".into(),
            name: "value".into(),
        })
        .to_string(),
        "Any?"
    );
}

#[test]
fn test_substitute_query() {
    let answer = ask(Query::Substitute {
        ty: "Box<T>?".into(),
        bindings: vec![("Box.T".into(), "out Dog".into())],
        position: Variance::Invariant,
    });
    assert_eq!(
        answer,
        Answer::Substitute {
            result: "Box<out Dog>?".into(),
            failed: false,
        }
    );

    let answer = ask(Query::Substitute {
        ty: "T".into(),
        bindings: vec![("Box.T".into(), "out Dog".into())],
        position: Variance::In,
    });
    assert!(matches!(answer, Answer::Substitute { failed: true, .. }));
}

#[test]
fn test_query_errors() {
    let session = session();
    let err = session
        .answer(
            &Query::Subtype {
                sub: "Dgo".into(),
                sup: "Animal".into(),
            },
            false,
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid type 'Dgo'");
    assert_eq!(format!("{:#}", err), "invalid type 'Dgo': unknown type 'Dgo'");

    let err = session
        .answer(
            &Query::Member {
                receiver: "Dog".into(),
                name: "bark".into(),
            },
            false,
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Dog has no member 'bark'");

    let err = session
        .answer(
            &Query::Substitute {
                ty: "T".into(),
                bindings: vec![("T".into(), "Int".into())],
                position: Variance::Invariant,
            },
            false,
        )
        .unwrap_err();
    assert!(err.to_string().contains("Class.Param"));

    assert!(
        session
            .answer(&Query::CommonSupertype { types: Vec::new() }, false)
            .is_err()
    );
}

#[test]
fn test_json_rendering() {
    let answer = ask(Query::Intersect {
        types: strings(&["Dog", "Cat"]),
    });
    assert_eq!(
        serde_json::to_string(&answer).unwrap(),
        r#"{"query":"intersect","result":null}"#
    );
    let answer = ask(Query::Subtype {
        sub: "Dog".into(),
        sup: "Animal".into(),
    });
    assert_eq!(
        serde_json::to_string(&answer).unwrap(),
        r#"{"query":"subtype","holds":true}"#
    );
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DECLS.as_bytes()).unwrap();
    let session = Session::load(file.path()).unwrap();
    let dog = session.parse("Dog").unwrap();
    assert_eq!(session.format(dog), "Dog");
    assert!(session.db().is_nullable(session.parse("Dog?").unwrap()));

    let missing = file.path().with_extension("missing");
    let Err(err) = Session::load(&missing) else {
        panic!("loading a missing file should fail");
    };
    assert!(err.to_string().starts_with("failed to read"));

    let mut broken = tempfile::NamedTempFile::new().unwrap();
    broken.write_all(b"{ \"classes\": [{ \"name\": \"Int\" }] }").unwrap();
    let Err(err) = Session::load(broken.path()) else {
        panic!("redeclaring a builtin should fail");
    };
    assert!(format!("{err:#}").ends_with("class 'Int' is declared twice"));
}

#[test]
fn test_builtins_only_session() {
    let session = Session::builtins_only();
    let answer = session
        .answer(
            &Query::CommonSupertype {
                types: strings(&["Int", "Nothing?"]),
            },
            false,
        )
        .unwrap();
    assert_eq!(answer.to_string(), "Int?");
}

#[test]
fn test_number_literals_join_to_a_primitive() {
    let session = Session::builtins_only();
    let join = |types: &[&str]| {
        session
            .answer(&Query::CommonSupertype { types: strings(types) }, false)
            .unwrap()
            .to_string()
    };
    assert_eq!(join(&["1", "200"]), "Int");
    assert_eq!(join(&["1", "3000000000", "Nothing?"]), "Long?");
    assert_eq!(join(&["2.5", "0.5"]), "Double");
}
