//! Declaration files and the type-expression reader.
//!
//! A declaration file describes a class hierarchy as JSON:
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "Base_T", "open": true, "type_parameters": [{ "name": "T" }] },
//!     { "name": "Derived_T", "open": true,
//!       "type_parameters": [{ "name": "T" }],
//!       "supertypes": ["Base_T<T>"] },
//!     { "name": "Props",
//!       "type_parameters": [{ "name": "T" }],
//!       "members": [{ "name": "p", "type": "T" }] }
//!   ]
//! }
//! ```
//!
//! Classes are final unless `open` is set; interfaces are always open.
//! A class without supertypes extends `Any`, and a type parameter without
//! bounds is bounded by `Any?`.
//!
//! Loading is two-phase: every class and parameter is registered first, then
//! supertypes, bounds and members are read, so hierarchies may refer to
//! classes declared later in the file and to themselves
//! (`class ARec : Rec<ARec>`, `T : Comparable<T>`).
//!
//! ## Type expressions
//!
//! ```text
//! type       := name arguments? '?'?
//!             | '{' type ('&' type)* '}' '?'?
//!             | number '?'?
//! arguments  := '<' projection (',' projection)* '>'
//! projection := '*' | ('in' | 'out')? type
//! ```
//!
//! Names resolve to type parameters in scope first, then declared classes,
//! then built-in classes. `*` is the star projection of the parameter it
//! is written against. A number such as `200` or `1.5` is the type of that
//! literal.

use crate::intern::TypeDatabase;
use crate::constructors::ConstructorInfo;
use crate::numbers::{NumberLiteral, number_value_type};
use crate::type_utils::{make_nullable_as_specified, star_projection};
use crate::types::{ConstructorId, ConstructorKind, TypeId, TypeProjection};
use crate::variance::Variance;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

// =============================================================================
// File format
// =============================================================================

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationFile {
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub type_parameters: Vec<TypeParamDecl>,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeParamDecl {
    pub name: String,
    #[serde(default)]
    pub variance: Variance,
    #[serde(default)]
    pub bounds: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl DeclarationFile {
    pub fn from_json(text: &str) -> Result<Self, DeclError> {
        serde_json::from_str(text).map_err(|err| DeclError::Json(err.to_string()))
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclError {
    /// The file is not valid JSON for the declaration format.
    Json(String),
    /// Two classes share a name, or a class shadows a built-in.
    DuplicateClass(String),
    /// A class declares two parameters with the same name.
    DuplicateParameter { class: String, parameter: String },
    /// A name in a type expression resolves to nothing.
    UnknownType(String),
    /// Wrong number of type arguments.
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// A supertype is nullable or not a class or interface.
    InvalidSupertype { class: String, supertype: String },
    /// Malformed type expression.
    Syntax {
        input: String,
        offset: usize,
        message: String,
    },
}

impl fmt::Display for DeclError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclError::Json(message) => write!(f, "invalid declaration file: {message}"),
            DeclError::DuplicateClass(name) => write!(f, "class '{name}' is declared twice"),
            DeclError::DuplicateParameter { class, parameter } => {
                write!(f, "class '{class}' declares type parameter '{parameter}' twice")
            }
            DeclError::UnknownType(name) => write!(f, "unknown type '{name}'"),
            DeclError::ArityMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "'{name}' takes {expected} type argument(s) but {found} were given"
            ),
            DeclError::InvalidSupertype { class, supertype } => {
                write!(f, "'{supertype}' cannot be a supertype of '{class}'")
            }
            DeclError::Syntax {
                input,
                offset,
                message,
            } => write!(f, "{message} at offset {offset} in '{input}'"),
        }
    }
}

impl std::error::Error for DeclError {}

// =============================================================================
// Loading
// =============================================================================

/// Names introduced by a loaded declaration file.
#[derive(Clone, Debug, Default)]
pub struct Declarations {
    classes: FxHashMap<String, ConstructorId>,
    parameters: FxHashMap<ConstructorId, Vec<(String, ConstructorId)>>,
}

impl Declarations {
    /// Register every class of `file` in the session behind `db`.
    pub fn load(db: &dyn TypeDatabase, file: &DeclarationFile) -> Result<Self, DeclError> {
        let store = db.constructors();
        let mut decls = Declarations::default();

        for class in &file.classes {
            if decls.classes.contains_key(&class.name)
                || db.builtins().by_name(&class.name).is_some()
            {
                return Err(DeclError::DuplicateClass(class.name.clone()));
            }
            let name = db.intern_string(&class.name);
            let info = match class.kind {
                ClassKind::Class => ConstructorInfo::class(name, !class.open),
                ClassKind::Interface => ConstructorInfo::interface(name),
            };
            let id = store.register(info);

            let mut parameters: Vec<(String, ConstructorId)> = Vec::new();
            for (index, param) in class.type_parameters.iter().enumerate() {
                if parameters.iter().any(|(n, _)| *n == param.name) {
                    return Err(DeclError::DuplicateParameter {
                        class: class.name.clone(),
                        parameter: param.name.clone(),
                    });
                }
                let param_id = store.register(ConstructorInfo::type_parameter(
                    db.intern_string(&param.name),
                    param.variance,
                    id,
                    index as u32,
                ));
                parameters.push((param.name.clone(), param_id));
            }
            store.set_parameters(id, parameters.iter().map(|(_, p)| *p).collect());
            decls.classes.insert(class.name.clone(), id);
            decls.parameters.insert(id, parameters);
        }

        for class in &file.classes {
            let id = decls.classes[&class.name];
            let scope: Vec<ConstructorId> = decls.parameters[&id].iter().map(|(_, p)| *p).collect();

            let mut supertypes = Vec::with_capacity(class.supertypes.len().max(1));
            for text in &class.supertypes {
                let ty = decls.parse_type_in(db, text, &scope)?;
                let valid = !db.is_nullable(ty)
                    && db
                        .lookup(ty)
                        .constructor()
                        .and_then(|c| store.get_kind(c))
                        .is_some_and(ConstructorKind::is_classifier);
                if !valid {
                    return Err(DeclError::InvalidSupertype {
                        class: class.name.clone(),
                        supertype: text.clone(),
                    });
                }
                supertypes.push(ty);
            }
            if supertypes.is_empty() {
                supertypes.push(db.builtins().any_type);
            }
            store.set_supertypes(id, supertypes);

            for (param, &(_, param_id)) in class.type_parameters.iter().zip(&decls.parameters[&id]) {
                let mut bounds = Vec::with_capacity(param.bounds.len().max(1));
                for text in &param.bounds {
                    bounds.push(decls.parse_type_in(db, text, &scope)?);
                }
                if bounds.is_empty() {
                    bounds.push(db.builtins().nullable_any);
                }
                store.set_supertypes(param_id, bounds);
            }

            for member in &class.members {
                let ty = decls.parse_type_in(db, &member.ty, &scope)?;
                store.add_member(id, db.intern_string(&member.name), ty);
            }
        }

        debug!(classes = decls.classes.len(), "declarations loaded");
        Ok(decls)
    }

    /// Declared or built-in class named `name`.
    pub fn class(&self, db: &dyn TypeDatabase, name: &str) -> Option<ConstructorId> {
        self.classes
            .get(name)
            .copied()
            .or_else(|| db.builtins().by_name(name))
    }

    /// Type parameter `parameter` of declared class `class`.
    pub fn parameter(&self, class: ConstructorId, parameter: &str) -> Option<ConstructorId> {
        self.parameters
            .get(&class)?
            .iter()
            .find(|(name, _)| name == parameter)
            .map(|(_, id)| *id)
    }

    /// Read a type expression with no type parameters in scope.
    pub fn parse_type(&self, db: &dyn TypeDatabase, text: &str) -> Result<TypeId, DeclError> {
        self.parse_type_in(db, text, &[])
    }

    /// Read a type expression with `scope` parameters visible by name.
    pub fn parse_type_in(
        &self,
        db: &dyn TypeDatabase,
        text: &str,
        scope: &[ConstructorId],
    ) -> Result<TypeId, DeclError> {
        let mut reader = TypeReader {
            db,
            decls: self,
            scope,
            input: text,
            pos: 0,
        };
        let ty = reader.read_type()?;
        reader.skip_whitespace();
        if reader.pos != text.len() {
            return Err(reader.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

// =============================================================================
// Type-expression reader
// =============================================================================

struct TypeReader<'r> {
    db: &'r dyn TypeDatabase,
    decls: &'r Declarations,
    scope: &'r [ConstructorId],
    input: &'r str,
    pos: usize,
}

impl TypeReader<'_> {
    fn error(&self, message: &str) -> DeclError {
        DeclError::Syntax {
            input: self.input.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), DeclError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn identifier(&mut self) -> Result<&str, DeclError> {
        self.skip_whitespace();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(&self.input[start..start + len])
    }

    /// A literal such as `42`, `-1` or `1.5`, if one starts here.
    fn number_literal(&mut self) -> Result<Option<NumberLiteral>, DeclError> {
        self.skip_whitespace();
        let rest = self.rest();
        let digits = rest.strip_prefix('-').unwrap_or(rest);
        if !digits.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(None);
        }
        let sign = rest.len() - digits.len();
        let len = sign
            + digits
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '_'))
                .unwrap_or(digits.len());
        let text: String = rest[..len].chars().filter(|&c| c != '_').collect();
        let literal = if text.contains('.') {
            text.parse().ok().map(NumberLiteral::Floating)
        } else {
            text.parse().ok().map(NumberLiteral::Integer)
        };
        match literal {
            Some(literal) => {
                self.pos += len;
                Ok(Some(literal))
            }
            None => Err(self.error("invalid number literal")),
        }
    }

    /// Variance keyword followed by whitespace, if present.
    fn variance_keyword(&mut self) -> Variance {
        self.skip_whitespace();
        for (keyword, variance) in [("in", Variance::In), ("out", Variance::Out)] {
            if let Some(after) = self.rest().strip_prefix(keyword) {
                if after.starts_with(char::is_whitespace) {
                    self.pos += keyword.len();
                    return variance;
                }
            }
        }
        Variance::Invariant
    }

    fn resolve(&self, name: &str) -> Result<ConstructorId, DeclError> {
        let db = self.db;
        let in_scope = self
            .scope
            .iter()
            .copied()
            .find(|&p| &*db.resolve_atom(db.constructor(p).name) == name);
        in_scope
            .or_else(|| self.decls.class(db, name))
            .ok_or_else(|| DeclError::UnknownType(name.to_string()))
    }

    fn read_type(&mut self) -> Result<TypeId, DeclError> {
        let db = self.db;
        if self.eat('{') {
            let mut members = vec![self.read_type()?];
            while self.eat('&') {
                members.push(self.read_type()?);
            }
            self.expect('}')?;
            let nullable = self.eat('?');
            let constructor = db.constructors().intersection(&members);
            return Ok(db.simple(constructor, &[], nullable));
        }

        if let Some(literal) = self.number_literal()? {
            let ty = number_value_type(db, literal);
            let nullable = self.eat('?');
            return Ok(make_nullable_as_specified(db, ty, nullable));
        }

        let name = self.identifier()?.to_string();
        let constructor = self.resolve(&name)?;
        let parameters = db.constructor(constructor).parameters.clone();

        let mut arguments = Vec::new();
        if self.eat('<') {
            loop {
                let index = arguments.len();
                if self.eat('*') {
                    let Some(&parameter) = parameters.get(index) else {
                        return Err(DeclError::ArityMismatch {
                            name,
                            expected: parameters.len(),
                            found: index + 1,
                        });
                    };
                    arguments.push(star_projection(db, parameter));
                } else {
                    let kind = self.variance_keyword();
                    arguments.push(TypeProjection::new(kind, self.read_type()?));
                }
                if !self.eat(',') {
                    break;
                }
            }
            self.expect('>')?;
        }
        if arguments.len() != parameters.len() {
            return Err(DeclError::ArityMismatch {
                name,
                expected: parameters.len(),
                found: arguments.len(),
            });
        }
        let nullable = self.eat('?');
        Ok(db.simple(constructor, &arguments, nullable))
    }
}

#[cfg(test)]
#[path = "tests/decl_tests.rs"]
mod tests;
