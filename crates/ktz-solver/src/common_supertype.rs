//! Least common supertype of a set of types.
//!
//! ## Algorithm
//!
//! 1. Drop `Nothing` and `Nothing?`; remember whether any input was
//!    nullable. Error types are ignored unless every input is an error.
//! 2. No inputs left: `Nothing` (or `Nothing?`). One left: that type.
//!    Several number literals are first joined into one number type (see
//!    [`common_supertype_for_number_types`]).
//! 3. *Raw supertypes.* Walk every input's supertype closure, substituting
//!    arguments along each edge, and record every instantiation seen per
//!    constructor. Keep the constructors visited from every input and, in
//!    most-derived-first order, select each one not already reachable from
//!    an earlier selection.
//! 4. While several constructors are selected, merge their instantiations
//!    and repeat step 3 on the merged set.
//! 5. *Projections.* With a single constructor left, rebuild each argument
//!    from the instantiations' arguments at that position (see
//!    [`CommonSupertypeSolver::supertype_projection`]).
//!
//! Argument reconstruction recurses into nested common supertypes. Types
//! such as `class ARec : Rec<ARec>` would recurse forever, so nesting is
//! cut at the deepest input's depth plus `COMMON_SUPERTYPE_EXTRA_DEPTH`,
//! where the argument becomes `out Any?`.

use crate::dfs::{DfsHandler, dfs};
use crate::format::TypeFormatter;
use crate::intern::TypeDatabase;
use crate::intersect::intersect;
use crate::numbers::{common_supertype_for_number_types, filter_number_types, is_number_value_type};
use crate::type_utils::{immediate_supertypes, make_nullable_if_needed, max_type_depth};
use crate::types::{ConstructorId, TypeId, TypeProjection};
use crate::variance::Variance;
use fixedbitset::FixedBitSet;
use indexmap::{IndexMap, IndexSet};
use ktz_common::limits::COMMON_SUPERTYPE_EXTRA_DEPTH;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::{debug, trace};

type TypeSet = IndexSet<TypeId, FxBuildHasher>;
type InstanceMap = IndexMap<ConstructorId, TypeSet, FxBuildHasher>;

/// Least common supertype of `types`.
///
/// # Panics
///
/// If `types` is empty.
pub fn common_supertype(db: &dyn TypeDatabase, types: &[TypeId]) -> TypeId {
    assert!(!types.is_empty(), "common supertype of an empty set of types");
    let max_depth = max_type_depth(db, types.iter().copied()) + COMMON_SUPERTYPE_EXTRA_DEPTH;
    trace!(count = types.len(), max_depth, "common_supertype");
    CommonSupertypeSolver { db, max_depth }.compute(types.iter().copied(), 0)
}

pub struct CommonSupertypeSolver<'a> {
    db: &'a dyn TypeDatabase,
    max_depth: u32,
}

impl<'a> CommonSupertypeSolver<'a> {
    pub fn new(db: &'a dyn TypeDatabase, max_depth: u32) -> Self {
        Self { db, max_depth }
    }

    pub fn compute(&self, types: impl IntoIterator<Item = TypeId>, depth: u32) -> TypeId {
        let db = self.db;
        let mut nullable = false;
        let mut errors: Vec<TypeId> = Vec::new();
        let mut set = TypeSet::default();
        for ty in types {
            let ty = db.canonical(ty);
            if db.is_error(ty) {
                errors.push(ty);
                continue;
            }
            nullable |= db.is_nullable(ty);
            if !db.is_nothing(ty) {
                set.insert(ty);
            }
        }

        if set.is_empty() {
            if let Some(&first) = errors.first() {
                return first;
            }
            return db.builtins().nothing(nullable);
        }
        if set.len() == 1 {
            return make_nullable_if_needed(db, set[0], nullable);
        }
        if set.iter().any(|&ty| is_number_value_type(db, ty)) {
            set = self.join_number_literals(&set);
            if set.len() == 1 {
                return make_nullable_if_needed(db, set[0], nullable);
            }
        }

        let mut common = self.common_raw_supertypes(&set);
        while common.len() > 1 {
            let merged: TypeSet = common.values().flatten().copied().collect();
            common = self.common_raw_supertypes(&merged);
        }
        let Some((constructor, instances)) = common.into_iter().next() else {
            panic!(
                "no common supertype found for {}",
                TypeFormatter::new(db).format_list(&set.into_iter().collect::<Vec<_>>())
            );
        };

        let result = self.supertype_projections(constructor, &instances, depth);
        make_nullable_if_needed(db, result, nullable)
    }

    /// Replace all number literals in `types` by their joined number type.
    fn join_number_literals(&self, types: &TypeSet) -> TypeSet {
        let all: Vec<TypeId> = types.iter().copied().collect();
        let (others, numbers) = filter_number_types(self.db, &all);
        let mut joined: TypeSet = others.into_iter().collect();
        if let Some(number) = common_supertype_for_number_types(self.db, &numbers) {
            debug!(literals = numbers.len(), number = number.0, "number literals joined");
            joined.insert(number);
        }
        joined
    }

    /// Most derived constructors common to every type's supertype closure,
    /// each with all of its instantiations.
    fn common_raw_supertypes(&self, types: &TypeSet) -> InstanceMap {
        let db = self.db;
        let mut instances = InstanceMap::default();
        let mut common: Option<FxHashSet<ConstructorId>> = None;
        let mut order: Vec<ConstructorId> = Vec::new();

        for &ty in types {
            let mut visited = FxHashSet::default();
            let mut collector = InstanceCollector {
                db,
                instances: &mut instances,
                post_order: Vec::new(),
            };
            dfs(
                [ty],
                |current: &TypeId| immediate_supertypes(db, *current),
                |current: &TypeId| db.constructor_of(*current),
                &mut visited,
                &mut collector,
            );
            // Most derived first.
            order.extend(collector.post_order.into_iter().rev());

            common = Some(match common {
                None => visited,
                Some(mut so_far) => {
                    so_far.retain(|c| visited.contains(c));
                    so_far
                }
            });
        }
        let common = common.unwrap_or_default();

        let mut shadowed = FixedBitSet::with_capacity(db.constructors().id_bound());
        let mut result = InstanceMap::default();
        for constructor in order {
            if !common.contains(&constructor) || contains(&shadowed, constructor) {
                continue;
            }
            if let Some(found) = instances.get(&constructor) {
                result.insert(constructor, found.clone());
            }
            self.mark_all(constructor, &mut shadowed);
        }
        debug!(
            inputs = types.len(),
            selected = result.len(),
            "common raw supertypes"
        );
        result
    }

    /// Mark `constructor` and everything it transitively extends.
    fn mark_all(&self, constructor: ConstructorId, marks: &mut FixedBitSet) {
        let mut stack = vec![constructor];
        while let Some(current) = stack.pop() {
            if contains(marks, current) {
                continue;
            }
            if current.index() >= marks.len() {
                marks.grow(current.index() + 1);
            }
            marks.insert(current.index());
            let Some(info) = self.db.constructors().get(current) else {
                continue;
            };
            stack.extend(info.supertypes.iter().map(|&st| self.db.constructor_of(st)));
        }
    }

    /// Merge instantiations of one constructor into a single type.
    fn supertype_projections(&self, constructor: ConstructorId, instances: &TypeSet, depth: u32) -> TypeId {
        let db = self.db;
        if instances.len() == 1 {
            return instances[0];
        }
        let info = db.constructor(constructor);
        let mut arguments = Vec::with_capacity(info.parameters.len());
        for (index, &parameter) in info.parameters.iter().enumerate() {
            let projections: IndexSet<TypeProjection, FxBuildHasher> = instances
                .iter()
                .filter_map(|&ty| db.lookup(ty).arguments().get(index).copied())
                .collect();
            arguments.push(self.supertype_projection(parameter, &projections, depth));
        }
        let nullable = instances.iter().any(|&ty| db.is_nullable(ty));
        db.simple(constructor, &arguments, nullable)
    }

    /// Merge the projections used for `parameter` across instantiations.
    ///
    /// Each projection can contribute to an in-bound (written values) and an
    /// out-bound (read values). A side is dropped entirely as soon as the
    /// declared variance or one projection kind rules it out.
    ///
    /// | Surviving side | Result |
    /// |----------------|--------|
    /// | in, non-empty intersection | `in ∩ins` (invariant on an `in` parameter) |
    /// | in, empty intersection | `out cs(outs)`, or `out cs(bounds)` without outs |
    /// | out only | `out cs(outs)` (invariant on an `out` parameter) |
    /// | neither | `out cs(bounds)` (invariant on an `out` parameter) |
    pub fn supertype_projection(
        &self,
        parameter: ConstructorId,
        projections: &IndexSet<TypeProjection, FxBuildHasher>,
        depth: u32,
    ) -> TypeProjection {
        let db = self.db;
        if projections.len() == 1 {
            return projections[0];
        }
        if depth >= self.max_depth {
            trace!(parameter = parameter.0, depth, "common supertype nesting cut off");
            return TypeProjection::out(db.builtins().nullable_any);
        }

        let declared = db.constructor(parameter).variance();
        let mut ins: Option<Vec<TypeId>> = (declared != Variance::Out).then(Vec::new);
        let mut outs: Option<Vec<TypeId>> = (declared != Variance::In).then(Vec::new);
        for projection in projections {
            if projection.kind.allows_in_position() {
                if let Some(ins) = ins.as_mut() {
                    ins.push(projection.ty);
                }
            } else {
                ins = None;
            }
            if projection.kind.allows_out_position() {
                if let Some(outs) = outs.as_mut() {
                    outs.push(projection.ty);
                }
            } else {
                outs = None;
            }
        }

        if let Some(ins) = ins {
            return match intersect(db, &ins) {
                Some(intersection) => {
                    let kind = if declared == Variance::In {
                        Variance::Invariant
                    } else {
                        Variance::In
                    };
                    TypeProjection::new(kind, intersection)
                }
                None => match outs {
                    Some(outs) => TypeProjection::out(self.compute(outs, depth + 1)),
                    None => TypeProjection::out(self.compute(self.upper_bounds(parameter), depth + 1)),
                },
            };
        }

        let kind = if declared == Variance::Out {
            Variance::Invariant
        } else {
            Variance::Out
        };
        match outs {
            Some(outs) => TypeProjection::new(kind, self.compute(outs, depth + 1)),
            None => TypeProjection::new(kind, self.compute(self.upper_bounds(parameter), depth + 1)),
        }
    }

    fn upper_bounds(&self, parameter: ConstructorId) -> Vec<TypeId> {
        let bounds = self.db.constructor(parameter).supertypes.clone();
        if bounds.is_empty() {
            vec![self.db.builtins().nullable_any]
        } else {
            bounds
        }
    }
}

fn contains(marks: &FixedBitSet, constructor: ConstructorId) -> bool {
    constructor.index() < marks.len() && marks.contains(constructor.index())
}

/// Records every instantiation per constructor and the finish order.
struct InstanceCollector<'c> {
    db: &'c dyn TypeDatabase,
    instances: &'c mut InstanceMap,
    post_order: Vec<ConstructorId>,
}

impl DfsHandler<TypeId> for InstanceCollector<'_> {
    fn before_children(&mut self, node: &TypeId) -> bool {
        self.instances
            .entry(self.db.constructor_of(*node))
            .or_default()
            .insert(*node);
        true
    }

    fn after_children(&mut self, node: &TypeId) {
        self.post_order.push(self.db.constructor_of(*node));
    }
}

#[cfg(test)]
#[path = "tests/common_supertype_tests.rs"]
mod tests;
