//! Shared class hierarchy for the scenario tests.

use crate::{DeclarationFile, Declarations, TypeDatabase, TypeFormatter, TypeId, TypeInterner};

pub const HIERARCHY: &str = r#"{
  "classes": [
    { "name": "Base_T", "open": true, "type_parameters": [{ "name": "T" }] },
    { "name": "Derived_T", "open": true, "type_parameters": [{ "name": "T" }],
      "supertypes": ["Base_T<T>"] },
    { "name": "DDerived_T", "open": true, "type_parameters": [{ "name": "T" }],
      "supertypes": ["Derived_T<T>"] },
    { "name": "DDerived1_T", "open": true, "type_parameters": [{ "name": "T" }],
      "supertypes": ["Derived_T<T>"] },

    { "name": "Base_inT", "open": true,
      "type_parameters": [{ "name": "T", "variance": "in" }] },
    { "name": "Derived_inT", "open": true,
      "type_parameters": [{ "name": "T", "variance": "in" }],
      "supertypes": ["Base_inT<T>"] },
    { "name": "Base_outT", "open": true,
      "type_parameters": [{ "name": "T", "variance": "out" }] },
    { "name": "Derived_outT", "open": true,
      "type_parameters": [{ "name": "T", "variance": "out" }],
      "supertypes": ["Base_outT<T>"] },
    { "name": "MDerived_T", "open": true, "type_parameters": [{ "name": "T" }],
      "supertypes": ["Base_outT<out T>", "Base_T<T>"] },

    { "name": "Properties", "members": [{ "name": "p", "type": "Int" }] },
    { "name": "Props", "type_parameters": [{ "name": "T" }],
      "members": [{ "name": "p", "type": "T" }] },

    { "name": "List", "kind": "interface", "type_parameters": [{ "name": "E" }] },
    { "name": "AbstractList", "open": true, "type_parameters": [{ "name": "E" }],
      "supertypes": ["List<E?>"] },
    { "name": "ArrayList", "open": true, "type_parameters": [{ "name": "E" }],
      "supertypes": ["Any", "AbstractList<E?>", "List<E?>"] },

    { "name": "Rec", "open": true, "type_parameters": [{ "name": "T" }] },
    { "name": "ARec", "supertypes": ["Rec<ARec>"] },
    { "name": "BRec", "supertypes": ["Rec<BRec>"] },
    { "name": "SubRec", "open": true, "type_parameters": [{ "name": "T" }],
      "supertypes": ["Rec<T>"] },

    { "name": "Parent", "open": true },
    { "name": "A", "supertypes": ["Parent"] },
    { "name": "B", "supertypes": ["Parent"] }
  ]
}"#;

/// A session with [`HIERARCHY`] loaded.
pub struct Fixture {
    pub db: TypeInterner,
    pub decls: Declarations,
}

/// Route solver logs through the test harness; `RUST_LOG=ktz_solver=trace`
/// shows them for a failing test.
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_source(HIERARCHY)
    }

    pub fn with_source(source: &str) -> Self {
        init_test_tracing();
        let db = TypeInterner::new();
        let file = DeclarationFile::from_json(source).expect("fixture parses");
        let decls = Declarations::load(&db, &file).expect("fixture loads");
        Self { db, decls }
    }

    pub fn ty(&self, text: &str) -> TypeId {
        match self.decls.parse_type(&self.db, text) {
            Ok(ty) => ty,
            Err(err) => panic!("bad type expression {text:?}: {err}"),
        }
    }

    pub fn show(&self, ty: TypeId) -> String {
        TypeFormatter::new(&self.db).format(ty)
    }

    pub fn db(&self) -> &dyn TypeDatabase {
        &self.db
    }
}
