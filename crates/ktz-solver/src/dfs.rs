//! Depth-first traversal over an implicit graph.
//!
//! Nodes are produced on demand by a `neighbors` closure and deduplicated
//! through a caller-owned visited set keyed by `key(node)`, so each key is
//! entered at most once even when the graph has cycles. A [`DfsHandler`]
//! observes the traversal:
//!
//! - `before_children` runs when a node is first entered and may prune its
//!   subtree by returning `false` (`after_children` is then skipped)
//! - `after_children` runs once every child has been finished, which makes
//!   it the post-order hook
//!
//! The walk uses an explicit stack and does not recurse.

use rustc_hash::FxHashSet;
use std::hash::Hash;

pub trait DfsHandler<N> {
    fn before_children(&mut self, _node: &N) -> bool {
        true
    }

    fn after_children(&mut self, _node: &N) {}
}

/// Walk every root in order, sharing `visited` between them.
pub fn dfs<N, K, H>(
    roots: impl IntoIterator<Item = N>,
    mut neighbors: impl FnMut(&N) -> Vec<N>,
    key: impl Fn(&N) -> K,
    visited: &mut FxHashSet<K>,
    handler: &mut H,
) where
    K: Eq + Hash,
    H: DfsHandler<N> + ?Sized,
{
    let mut stack: Vec<(N, std::vec::IntoIter<N>)> = Vec::new();
    for root in roots {
        if !visited.insert(key(&root)) || !handler.before_children(&root) {
            continue;
        }
        let children = neighbors(&root).into_iter();
        stack.push((root, children));

        while let Some((_, children)) = stack.last_mut() {
            match children.next() {
                Some(child) => {
                    if visited.insert(key(&child)) && handler.before_children(&child) {
                        let grandchildren = neighbors(&child).into_iter();
                        stack.push((child, grandchildren));
                    }
                }
                None => {
                    if let Some((node, _)) = stack.pop() {
                        handler.after_children(&node);
                    }
                }
            }
        }
    }
}

/// Handler that records nodes in post-order.
#[derive(Debug)]
pub struct PostOrder<N> {
    pub nodes: Vec<N>,
}

impl<N> Default for PostOrder<N> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<N: Clone> DfsHandler<N> for PostOrder<N> {
    fn after_children(&mut self, node: &N) {
        self.nodes.push(node.clone());
    }
}

/// Nodes reachable from `roots` in post-order: every node appears after all
/// nodes reachable from it that were first discovered through it.
pub fn post_order<N, K>(
    roots: impl IntoIterator<Item = N>,
    neighbors: impl FnMut(&N) -> Vec<N>,
    key: impl Fn(&N) -> K,
) -> Vec<N>
where
    N: Clone,
    K: Eq + Hash,
{
    let mut visited = FxHashSet::default();
    let mut handler = PostOrder::default();
    dfs(roots, neighbors, key, &mut visited, &mut handler);
    handler.nodes
}

/// Reverse post-order: roots before the nodes they reach. On an acyclic
/// graph this is a topological order.
pub fn topological_order<N, K>(
    roots: impl IntoIterator<Item = N>,
    neighbors: impl FnMut(&N) -> Vec<N>,
    key: impl Fn(&N) -> K,
) -> Vec<N>
where
    N: Clone,
    K: Eq + Hash,
{
    let mut nodes = post_order(roots, neighbors, key);
    nodes.reverse();
    nodes
}

#[cfg(test)]
#[path = "tests/dfs_tests.rs"]
mod tests;
