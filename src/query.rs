//! Queries against a loaded declaration file.
//!
//! A [`Session`] owns one type interner with a declaration file loaded into
//! it. Every query names its types as type expressions (`Base_T<out Int>?`)
//! and produces an [`Answer`] that renders either as text or as JSON.

use anyhow::{Context, Result, bail};
use ktz_solver::{
    DeclarationFile, Declarations, Substitution, SubtypeFailureReason, TypeDatabase,
    TypeFormatter, TypeId, TypeInterner, TypeProjection, TypeSubstitutor, Variance,
    common_supertype, equal_types, explain_failure, intersect, is_subtype_of, member_scope,
};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// One query, with types still in source form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    Subtype { sub: String, sup: String },
    Equal { a: String, b: String },
    CommonSupertype { types: Vec<String> },
    Intersect { types: Vec<String> },
    Substitute {
        ty: String,
        /// `Class.Param` paired with the replacement type.
        bindings: Vec<(String, String)>,
        position: Variance,
    },
    Member { receiver: String, name: String },
}

/// Result of a query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "query", rename_all = "kebab-case")]
pub enum Answer {
    Subtype {
        holds: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<SubtypeFailureReason>,
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    Equal {
        holds: bool,
    },
    CommonSupertype {
        result: String,
    },
    /// `None` when no value inhabits every input.
    Intersect {
        result: Option<String>,
    },
    Substitute {
        result: String,
        failed: bool,
    },
    Member {
        result: String,
    },
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Subtype {
                holds, explanation, ..
            } => {
                write!(f, "{holds}")?;
                if let Some(explanation) = explanation {
                    write!(f, "\n{explanation}")?;
                }
                Ok(())
            }
            Answer::Equal { holds } => write!(f, "{holds}"),
            Answer::CommonSupertype { result }
            | Answer::Member { result }
            | Answer::Substitute { result, .. } => f.write_str(result),
            Answer::Intersect { result } => f.write_str(result.as_deref().unwrap_or("<empty>")),
        }
    }
}

pub struct Session {
    db: TypeInterner,
    decls: Declarations,
}

impl Session {
    /// Session with only the built-in classes.
    pub fn builtins_only() -> Self {
        Self {
            db: TypeInterner::new(),
            decls: Declarations::default(),
        }
    }

    pub fn from_source(json: &str) -> Result<Self> {
        let db = TypeInterner::new();
        let file = DeclarationFile::from_json(json)?;
        let decls = Declarations::load(&db, &file)?;
        Ok(Self { db, decls })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_source(&json)
            .with_context(|| format!("failed to load declarations from {}", path.display()))
    }

    pub fn db(&self) -> &dyn TypeDatabase {
        &self.db
    }

    pub fn parse(&self, text: &str) -> Result<TypeId> {
        self.decls
            .parse_type(&self.db, text)
            .with_context(|| format!("invalid type '{text}'"))
    }

    pub fn format(&self, ty: TypeId) -> String {
        TypeFormatter::new(&self.db).format(ty)
    }

    fn parse_all(&self, texts: &[String]) -> Result<Vec<TypeId>> {
        texts.iter().map(|text| self.parse(text)).collect()
    }

    pub fn answer(&self, query: &Query, explain: bool) -> Result<Answer> {
        debug!(?query, explain, "answering query");
        let db = &self.db;
        Ok(match query {
            Query::Subtype { sub, sup } => {
                let (sub, sup) = (self.parse(sub)?, self.parse(sup)?);
                let holds = is_subtype_of(db, sub, sup);
                let reason = if explain && !holds {
                    explain_failure(db, sub, sup)
                } else {
                    None
                };
                let explanation = reason.as_ref().map(|reason| reason.render(db));
                Answer::Subtype {
                    holds,
                    reason,
                    explanation,
                }
            }
            Query::Equal { a, b } => Answer::Equal {
                holds: equal_types(db, self.parse(a)?, self.parse(b)?),
            },
            Query::CommonSupertype { types } => {
                if types.is_empty() {
                    bail!("common-supertype needs at least one type");
                }
                let types = self.parse_all(types)?;
                Answer::CommonSupertype {
                    result: self.format(common_supertype(db, &types)),
                }
            }
            Query::Intersect { types } => {
                let types = self.parse_all(types)?;
                Answer::Intersect {
                    result: intersect(db, &types).map(|ty| self.format(ty)),
                }
            }
            Query::Substitute {
                ty,
                bindings,
                position,
            } => {
                let mut map = Vec::with_capacity(bindings.len());
                for (parameter, value) in bindings {
                    map.push((self.parameter(parameter)?, self.parse_projection(value)?));
                }
                // Bound parameters are visible by their short name.
                let scope: Vec<_> = map.iter().map(|(parameter, _)| *parameter).collect();
                let ty = self
                    .decls
                    .parse_type_in(db, ty, &scope)
                    .with_context(|| format!("invalid type '{ty}'"))?;
                let substitutor =
                    TypeSubstitutor::new(db, Substitution::from_map(map.into_iter().collect()));
                let result = substitutor.safe_substitute(ty, *position);
                Answer::Substitute {
                    result: self.format(result),
                    failed: db.is_error(result) && !db.is_error(ty),
                }
            }
            Query::Member { receiver, name } => {
                let receiver = self.parse(receiver)?;
                let Some(member) = member_scope(db, receiver).lookup(db, name) else {
                    bail!("{} has no member '{name}'", self.format(receiver));
                };
                Answer::Member {
                    result: self.format(member),
                }
            }
        })
    }

    /// Resolve `Class.Param`.
    fn parameter(&self, qualified: &str) -> Result<ktz_solver::ConstructorId> {
        let Some((class, parameter)) = qualified.rsplit_once('.') else {
            bail!("type parameter '{qualified}' must be written as Class.Param");
        };
        let Some(class_id) = self.decls.class(&self.db, class) else {
            bail!("unknown class '{class}'");
        };
        self.decls
            .parameter(class_id, parameter)
            .with_context(|| format!("class '{class}' has no type parameter '{parameter}'"))
    }

    /// A binding value may carry a projection keyword: `out Int`.
    fn parse_projection(&self, text: &str) -> Result<TypeProjection> {
        let text = text.trim();
        for (keyword, kind) in [("in ", Variance::In), ("out ", Variance::Out)] {
            if let Some(rest) = text.strip_prefix(keyword) {
                return Ok(TypeProjection::new(kind, self.parse(rest)?));
            }
        }
        Ok(TypeProjection::invariant(self.parse(text)?))
    }
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
