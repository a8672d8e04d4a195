//! Slices: disjoint node groups keyed by a pattern capture.

use std::collections::{BTreeMap, HashMap};

use crate::graph::{DependencyGraph, NodeId};
use crate::pattern::PackagePattern;

/// Index of a slice inside one [`Slices`] partition; ordered by slice name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SliceId(usize);

impl SliceId {
    /// Returns the position of this slice in name order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A partition of (some of) the graph's nodes into named slices.
///
/// A node belongs to at most one slice: the one named by the capture of the
/// slice pattern applied to its package. Nodes whose package does not match
/// belong to none.
#[derive(Debug, Clone)]
pub struct Slices {
    names: Vec<String>,
    by_name: HashMap<String, SliceId>,
    of_node: Vec<Option<SliceId>>,
    members: Vec<Vec<NodeId>>,
}

impl Slices {
    /// Partitions the nodes of `graph` with `pattern`.
    ///
    /// `pattern` is expected to contain a capture group; without one no node
    /// is assigned to a slice.
    #[must_use]
    pub fn partition(graph: &DependencyGraph, pattern: &PackagePattern) -> Self {
        let mut grouped: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
        for id in graph.node_ids() {
            if let Some(key) = pattern.slice_key(graph.node(id).package()) {
                grouped.entry(key).or_default().push(id);
            }
        }

        let mut names = Vec::with_capacity(grouped.len());
        let mut members = Vec::with_capacity(grouped.len());
        let mut of_node = vec![None; graph.len()];
        for (i, (name, nodes)) in grouped.into_iter().enumerate() {
            for &node in &nodes {
                of_node[node.index()] = Some(SliceId(i));
            }
            names.push(name.to_string());
            members.push(nodes);
        }
        let by_name = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), SliceId(i)))
            .collect();

        Self {
            names,
            by_name,
            of_node,
            members,
        }
    }

    /// Returns the number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no node matched the pattern.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over slice ids in name order.
    pub fn ids(&self) -> impl Iterator<Item = SliceId> {
        (0..self.names.len()).map(SliceId)
    }

    /// Returns the name of a slice.
    #[must_use]
    pub fn name(&self, id: SliceId) -> &str {
        &self.names[id.0]
    }

    /// Looks up a slice by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<SliceId> {
        self.by_name.get(name).copied()
    }

    /// Returns the slice of a node, if any.
    #[must_use]
    pub fn slice_of(&self, node: NodeId) -> Option<SliceId> {
        self.of_node[node.index()]
    }

    /// Returns the nodes of a slice in name order.
    #[must_use]
    pub fn members(&self, id: SliceId) -> &[NodeId] {
        &self.members[id.0]
    }
}
