//! Human-readable rendering of types.
//!
//! | Type | Rendering |
//! |------|-----------|
//! | class instance | `Map<String, out Int>?` |
//! | type parameter | `T`, `T?` |
//! | intersection | `{Int & String}` |
//! | error | `[ERROR : message]` |
//!
//! Star projections are not special: `*` for a parameter bounded by `Any?`
//! prints as `out Any?`.

use crate::intern::TypeDatabase;
use crate::types::{ConstructorId, ConstructorKind, TypeData, TypeId, TypeProjection};
use crate::variance::Variance;
use std::fmt::Write;

pub struct TypeFormatter<'a> {
    db: &'a dyn TypeDatabase,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self { db }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    pub fn format_projection(&self, projection: TypeProjection) -> String {
        let mut out = String::new();
        self.write_projection(&mut out, projection);
        out
    }

    /// Name of a constructor; intersections list their members.
    pub fn format_constructor(&self, constructor: ConstructorId) -> String {
        let mut out = String::new();
        self.write_constructor(&mut out, constructor);
        out
    }

    /// Comma-separated rendering of several types.
    pub fn format_list(&self, types: &[TypeId]) -> String {
        types
            .iter()
            .map(|&ty| self.format(ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn write_type(&self, out: &mut String, ty: TypeId) {
        match self.db.lookup(ty) {
            TypeData::Simple {
                constructor,
                arguments,
                nullable,
            } => {
                self.write_constructor(out, constructor);
                if !arguments.is_empty() {
                    out.push('<');
                    for (i, argument) in arguments.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write_projection(out, *argument);
                    }
                    out.push('>');
                }
                if nullable {
                    out.push('?');
                }
            }
            TypeData::Error { message } => {
                let _ = write!(out, "[ERROR : {}]", self.db.resolve_atom(message));
            }
            // `lookup` resolves deferred types.
            TypeData::Deferred(id) => {
                let _ = write!(out, "<deferred {}>", id.0);
            }
        }
    }

    fn write_projection(&self, out: &mut String, projection: TypeProjection) {
        if projection.kind != Variance::Invariant {
            out.push_str(projection.kind.label());
            out.push(' ');
        }
        self.write_type(out, projection.ty);
    }

    fn write_constructor(&self, out: &mut String, constructor: ConstructorId) {
        let Some(info) = self.db.constructors().get(constructor) else {
            let _ = write!(out, "<constructor {}>", constructor.0);
            return;
        };
        if info.kind == ConstructorKind::Intersection {
            out.push('{');
            for (i, member) in info.supertypes.iter().enumerate() {
                if i > 0 {
                    out.push_str(" & ");
                }
                self.write_type(out, *member);
            }
            out.push('}');
        } else {
            out.push_str(&self.db.resolve_atom(info.name));
        }
    }
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
