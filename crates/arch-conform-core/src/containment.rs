//! Containment resolution along enclosing links.
//!
//! An access made from inside a nested unit is attributed to the outermost
//! unit containing it. Rules that reason about "who accesses whom" use the
//! effective origin instead of the raw dependency origin.

use crate::graph::{DependencyGraph, NodeId};

/// Walks the enclosing chain of `node` up to the outermost unit.
///
/// A node without an enclosing link resolves to itself. Terminates because
/// [`DependencyGraph`] rejects enclosing cycles at build time.
#[must_use]
pub fn resolve_origin(graph: &DependencyGraph, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(parent) = graph.enclosing(current) {
        current = parent;
    }
    current
}

/// Returns the enclosing units of `node`, innermost first.
///
/// The last element (if any) is the effective origin of `node`.
#[must_use]
pub fn enclosing_chain(graph: &DependencyGraph, node: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut current = node;
    while let Some(parent) = graph.enclosing(current) {
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Effective origins for every node of a graph, computed once.
///
/// Rules that resolve many origins share one resolver instead of walking
/// the same chains repeatedly.
#[derive(Debug, Clone)]
pub struct ContainmentResolver {
    roots: Vec<NodeId>,
}

impl ContainmentResolver {
    /// Resolves every node of `graph`.
    #[must_use]
    pub fn new(graph: &DependencyGraph) -> Self {
        let mut roots: Vec<NodeId> = graph.node_ids().collect();
        let mut resolved = vec![false; graph.len()];
        for id in graph.node_ids() {
            if resolved[id.index()] {
                continue;
            }
            let mut walk = vec![id];
            let mut current = id;
            while !resolved[current.index()] {
                match graph.enclosing(current) {
                    Some(parent) => {
                        walk.push(parent);
                        current = parent;
                    }
                    None => break,
                }
            }
            let root = if resolved[current.index()] {
                roots[current.index()]
            } else {
                current
            };
            for visited in walk {
                roots[visited.index()] = root;
                resolved[visited.index()] = true;
            }
        }
        Self { roots }
    }

    /// Returns the effective origin of `node`.
    #[must_use]
    pub fn resolve_origin(&self, node: NodeId) -> NodeId {
        self.roots[node.index()]
    }

    /// Returns true if `a` and `b` share the same outermost unit.
    #[must_use]
    pub fn same_unit(&self, a: NodeId, b: NodeId) -> bool {
        self.resolve_origin(a) == self.resolve_origin(b)
    }
}
