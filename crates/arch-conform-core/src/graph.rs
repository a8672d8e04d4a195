//! Immutable dependency graph of code units.
//!
//! Nodes are code units (classes, types) identified by fully-qualified name.
//! Edges are "origin depends on target" relationships. Containment (a unit
//! nested inside another) is kept apart from edges: each node carries an
//! optional link to its immediate enclosing node, and the graph derives the
//! reverse index of nested units.
//!
//! Graphs are assembled with [`GraphBuilder`] and never mutated afterwards.

use std::collections::HashMap;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Index of a node inside one [`DependencyGraph`].
///
/// Ids are assigned in fully-qualified-name order, so sorting by id sorts by
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the position of this node in [`DependencyGraph::nodes`].
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a unit is nested inside another unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NestingKind {
    /// Not nested.
    #[default]
    TopLevel,
    /// Declared as a member of another unit.
    Member,
    /// Inner, local or anonymous unit declared inside another unit's code.
    Inner,
}

impl NestingKind {
    /// Returns true for member and inner units.
    #[must_use]
    pub fn is_nested(self) -> bool {
        !matches!(self, Self::TopLevel)
    }
}

/// Where a unit comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSource {
    /// Production code.
    #[default]
    Main,
    /// Test code.
    Test,
    /// Library or other third-party code.
    External,
}

/// One code unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    package: String,
    kind: NestingKind,
    source: UnitSource,
    enclosing: Option<NodeId>,
}

impl Node {
    /// Returns the fully-qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the package path (`.` separated, empty for the default package).
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Returns the nesting kind.
    #[must_use]
    pub fn kind(&self) -> NestingKind {
        self.kind
    }

    /// Returns where the unit comes from.
    #[must_use]
    pub fn source(&self) -> UnitSource {
        self.source
    }

    /// Returns the immediate enclosing node, if it is part of the graph.
    #[must_use]
    pub fn enclosing(&self) -> Option<NodeId> {
        self.enclosing
    }

    /// Returns true if the unit is nested inside another unit.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.kind.is_nested()
    }

    /// Returns true if the unit is a member of another unit.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.kind == NestingKind::Member
    }
}

/// A directed dependency between two nodes of the same graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    /// The depending node.
    pub origin: NodeId,
    /// The node depended upon.
    pub target: NodeId,
}

/// Description of a node to be added through [`GraphBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    name: String,
    package: String,
    kind: NestingKind,
    source: UnitSource,
    enclosing: Option<String>,
}

impl NodeSpec {
    /// Creates a top-level production unit.
    #[must_use]
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            kind: NestingKind::TopLevel,
            source: UnitSource::Main,
            enclosing: None,
        }
    }

    /// Declares the unit as a member of `enclosing`.
    #[must_use]
    pub fn member_of(mut self, enclosing: impl Into<String>) -> Self {
        self.kind = NestingKind::Member;
        self.enclosing = Some(enclosing.into());
        self
    }

    /// Declares the unit as an inner/local/anonymous unit of `enclosing`.
    #[must_use]
    pub fn inner_of(mut self, enclosing: impl Into<String>) -> Self {
        self.kind = NestingKind::Inner;
        self.enclosing = Some(enclosing.into());
        self
    }

    /// Sets the nesting kind without touching the enclosing link.
    #[must_use]
    pub fn kind(mut self, kind: NestingKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the enclosing unit name without touching the nesting kind.
    #[must_use]
    pub fn enclosing(mut self, enclosing: Option<String>) -> Self {
        self.enclosing = enclosing;
        self
    }

    /// Sets where the unit comes from.
    #[must_use]
    pub fn source(mut self, source: UnitSource) -> Self {
        self.source = source;
        self
    }

    /// Returns the fully-qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Assembles a [`DependencyGraph`], validating it on [`GraphBuilder::build`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<NodeSpec>,
    edges: Vec<(String, String)>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    #[must_use]
    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.nodes.push(spec);
        self
    }

    /// Adds a dependency from `origin` to `target` (both by name).
    ///
    /// Repeated edges collapse into one.
    #[must_use]
    pub fn edge(mut self, origin: impl Into<String>, target: impl Into<String>) -> Self {
        self.edges.push((origin.into(), target.into()));
        self
    }

    /// Validates the input and freezes it into a graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphBuildError`] on duplicate node names, edges or enclosing
    /// links that name unknown nodes, enclosing cycles, and top-level nodes
    /// that declare an enclosing node.
    pub fn build(self) -> Result<DependencyGraph, GraphBuildError> {
        let mut specs = self.nodes;
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = specs.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(GraphBuildError::DuplicateNode {
                name: pair[0].name.clone(),
            });
        }

        let index: HashMap<String, NodeId> = specs
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), NodeId(i)))
            .collect();

        let mut nodes = Vec::with_capacity(specs.len());
        for spec in specs {
            let enclosing = match &spec.enclosing {
                None => None,
                Some(parent) if spec.kind == NestingKind::TopLevel => {
                    return Err(GraphBuildError::TopLevelWithEnclosing {
                        node: spec.name.clone(),
                        enclosing: parent.clone(),
                    });
                }
                Some(parent) => Some(index.get(parent).copied().ok_or_else(|| {
                    GraphBuildError::UnknownEnclosing {
                        node: spec.name.clone(),
                        enclosing: parent.clone(),
                    }
                })?),
            };
            nodes.push(Node {
                name: spec.name,
                package: spec.package,
                kind: spec.kind,
                source: spec.source,
                enclosing,
            });
        }

        check_enclosing_forest(&nodes)?;

        let mut outgoing: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
        let mut incoming: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
        for (origin, target) in &self.edges {
            let lookup = |name: &String| {
                index
                    .get(name)
                    .copied()
                    .ok_or_else(|| GraphBuildError::DanglingEdge {
                        origin: origin.clone(),
                        target: target.clone(),
                        missing: name.clone(),
                    })
            };
            let o = lookup(origin)?;
            let t = lookup(target)?;
            outgoing[o.0].push(t);
            incoming[t.0].push(o);
        }
        for list in outgoing.iter_mut().chain(incoming.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }
        let edge_count = outgoing.iter().map(Vec::len).sum();

        let mut nested: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            if let Some(parent) = node.enclosing {
                nested[parent.0].push(NodeId(i));
            }
        }

        debug!(nodes = nodes.len(), edges = edge_count, "dependency graph built");

        Ok(DependencyGraph {
            nodes,
            index,
            outgoing,
            incoming,
            nested,
            edge_count,
        })
    }
}

/// Fails if following enclosing links from any node revisits a node.
fn check_enclosing_forest(nodes: &[Node]) -> Result<(), GraphBuildError> {
    // 0 = unvisited, 1 = on current walk, 2 = known to reach a root
    let mut state = vec![0u8; nodes.len()];
    for start in 0..nodes.len() {
        let mut walk = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            match state[i] {
                2 => break,
                1 => {
                    return Err(GraphBuildError::EnclosingCycle {
                        node: nodes[i].name.clone(),
                    })
                }
                _ => {
                    state[i] = 1;
                    walk.push(i);
                    current = nodes[i].enclosing.map(NodeId::index);
                }
            }
        }
        for i in walk {
            state[i] = 2;
        }
    }
    Ok(())
}

/// A frozen dependency graph.
///
/// All adjacency lists are deduplicated and sorted by node name. The graph is
/// `Send + Sync` and can be shared by concurrently running rules.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    outgoing: Vec<Vec<NodeId>>,
    incoming: Vec<Vec<NodeId>>,
    nested: Vec<Vec<NodeId>>,
    edge_count: usize,
}

impl DependencyGraph {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns all nodes in id order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Iterates over all node ids in name order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Returns the node for an id.
    ///
    /// # Panics
    ///
    /// Panics if the id belongs to a different graph with more nodes.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the fully-qualified name of a node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Looks up a node by fully-qualified name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Returns the nodes `id` depends on.
    #[must_use]
    pub fn outgoing(&self, id: NodeId) -> &[NodeId] {
        &self.outgoing[id.0]
    }

    /// Returns the nodes depending on `id`.
    #[must_use]
    pub fn incoming(&self, id: NodeId) -> &[NodeId] {
        &self.incoming[id.0]
    }

    /// Returns the immediate enclosing node of `id`.
    #[must_use]
    pub fn enclosing(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].enclosing
    }

    /// Returns the units directly nested inside `id`.
    #[must_use]
    pub fn nested_units(&self, id: NodeId) -> &[NodeId] {
        &self.nested[id.0]
    }

    /// Returns true if `origin` depends on `target`.
    #[must_use]
    pub fn has_edge(&self, origin: NodeId, target: NodeId) -> bool {
        self.outgoing[origin.0].binary_search(&target).is_ok()
    }

    /// Iterates over all edges ordered by origin, then target.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.outgoing.iter().enumerate().flat_map(|(i, targets)| {
            targets.iter().map(move |&target| Edge {
                origin: NodeId(i),
                target,
            })
        })
    }
}

/// Errors while building a [`DependencyGraph`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum GraphBuildError {
    /// Two nodes share a fully-qualified name.
    #[error("duplicate code unit `{name}`")]
    #[diagnostic(code(arch_conform::graph::duplicate_node))]
    DuplicateNode {
        /// The repeated name.
        name: String,
    },

    /// An edge names a node that is not part of the graph.
    #[error("dependency `{origin}` -> `{target}` references unknown unit `{missing}`")]
    #[diagnostic(
        code(arch_conform::graph::dangling_edge),
        help("every dependency endpoint must be listed as a unit")
    )]
    DanglingEdge {
        /// Origin name of the edge.
        origin: String,
        /// Target name of the edge.
        target: String,
        /// The endpoint that could not be found.
        missing: String,
    },

    /// An enclosing link names a node that is not part of the graph.
    #[error("unit `{node}` is enclosed by unknown unit `{enclosing}`")]
    #[diagnostic(code(arch_conform::graph::unknown_enclosing))]
    UnknownEnclosing {
        /// The nested node.
        node: String,
        /// The missing enclosing name.
        enclosing: String,
    },

    /// Following enclosing links from a node leads back to it.
    #[error("enclosing links form a cycle through `{node}`")]
    #[diagnostic(code(arch_conform::graph::enclosing_cycle))]
    EnclosingCycle {
        /// A node on the cycle.
        node: String,
    },

    /// A top-level node declares an enclosing node.
    #[error("top-level unit `{node}` cannot be enclosed by `{enclosing}`")]
    #[diagnostic(
        code(arch_conform::graph::top_level_enclosed),
        help("declare the unit as `member` or `inner`")
    )]
    TopLevelWithEnclosing {
        /// The offending node.
        node: String,
        /// The declared enclosing name.
        enclosing: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DependencyGraph {
        DependencyGraph::builder()
            .node(NodeSpec::new("pkg.b.Y", "pkg.b"))
            .node(NodeSpec::new("pkg.a.X", "pkg.a"))
            .node(NodeSpec::new("pkg.a.X$Inner", "pkg.a").inner_of("pkg.a.X"))
            .edge("pkg.a.X", "pkg.b.Y")
            .edge("pkg.a.X", "pkg.b.Y")
            .edge("pkg.a.X$Inner", "pkg.a.X")
            .build()
            .unwrap()
    }

    #[test]
    fn ids_follow_name_order() {
        let graph = sample();
        let names: Vec<&str> = graph.nodes().iter().map(Node::name).collect();
        assert_eq!(names, vec!["pkg.a.X", "pkg.a.X$Inner", "pkg.b.Y"]);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let graph = sample();
        assert_eq!(graph.edge_count(), 2);
        let x = graph.lookup("pkg.a.X").unwrap();
        let y = graph.lookup("pkg.b.Y").unwrap();
        assert_eq!(graph.outgoing(x), &[y]);
        assert_eq!(graph.incoming(y), &[x]);
        assert!(graph.has_edge(x, y));
        assert!(!graph.has_edge(y, x));
    }

    #[test]
    fn containment_is_not_an_edge() {
        let graph = sample();
        let x = graph.lookup("pkg.a.X").unwrap();
        let inner = graph.lookup("pkg.a.X$Inner").unwrap();
        assert_eq!(graph.enclosing(inner), Some(x));
        assert_eq!(graph.nested_units(x), &[inner]);
        assert!(graph.node(inner).is_nested());
        assert!(!graph.node(inner).is_member());
        assert!(!graph.has_edge(x, inner));
    }

    #[test]
    fn edges_iterate_in_order() {
        let graph = sample();
        let pairs: Vec<(&str, &str)> = graph
            .edges()
            .map(|e| (graph.name(e.origin), graph.name(e.target)))
            .collect();
        assert_eq!(
            pairs,
            vec![("pkg.a.X", "pkg.b.Y"), ("pkg.a.X$Inner", "pkg.a.X")]
        );
    }

    #[test]
    fn rejects_duplicate_node() {
        let err = DependencyGraph::builder()
            .node(NodeSpec::new("a.A", "a"))
            .node(NodeSpec::new("a.A", "a"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GraphBuildError::DuplicateNode {
                name: "a.A".to_string()
            }
        );
    }

    #[test]
    fn rejects_dangling_edge() {
        let err = DependencyGraph::builder()
            .node(NodeSpec::new("a.A", "a"))
            .edge("a.A", "a.Missing")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            GraphBuildError::DanglingEdge { ref missing, .. } if missing == "a.Missing"
        ));
    }

    #[test]
    fn rejects_unknown_enclosing() {
        let err = DependencyGraph::builder()
            .node(NodeSpec::new("a.A$B", "a").member_of("a.A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphBuildError::UnknownEnclosing { .. }));
    }

    #[test]
    fn rejects_enclosing_cycle() {
        let err = DependencyGraph::builder()
            .node(NodeSpec::new("a.A", "a").member_of("a.B"))
            .node(NodeSpec::new("a.B", "a").member_of("a.A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphBuildError::EnclosingCycle { .. }));

        let err = DependencyGraph::builder()
            .node(NodeSpec::new("a.A", "a").member_of("a.A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphBuildError::EnclosingCycle { .. }));
    }

    #[test]
    fn rejects_top_level_with_enclosing() {
        let err = DependencyGraph::builder()
            .node(NodeSpec::new("a.A", "a"))
            .node(
                NodeSpec::new("a.B", "a")
                    .enclosing(Some("a.A".to_string()))
                    .kind(NestingKind::TopLevel),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphBuildError::TopLevelWithEnclosing { .. }));
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = GraphBuilder::new().build().unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.edges().count(), 0);
    }
}
