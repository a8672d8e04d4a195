//! Rule that requires slices to be free of dependency cycles.
//!
//! # Rationale
//!
//! Slices are the feature modules of a code base, one per value captured by
//! the slice pattern. Once two slices depend on each other they can no longer
//! be understood, tested or extracted separately.
//!
//! # Detected Patterns
//!
//! - A strongly connected component of two or more slices in the slice
//!   dependency graph. One violation is reported per component, showing a
//!   shortest cycle through its first slice together with the node-level
//!   dependencies behind every hop.

use std::collections::{BTreeMap, VecDeque};

use crate::graph::{DependencyGraph, Edge};
use crate::pattern::{PackagePattern, PatternError};
use crate::rule::{GraphRule, RuleMeta};
use crate::slices::Slices;
use crate::types::{Severity, Suggestion, Violation, Witness};

/// Rule code for slice-cycles.
pub const CODE: &str = "AC003";

/// Rule name for slice-cycles.
pub const NAME: &str = "slice-cycles";

/// Default cap on node-level witnesses listed per cycle hop.
pub const DEFAULT_MAX_WITNESSES_PER_HOP: usize = 20;

/// Configuration of a slice-cycle check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceCyclesConfig {
    /// Package pattern with exactly one `(*)` capture naming the slice.
    pub slice_pattern: String,
    /// Maximum witnesses listed for each hop of a reported cycle.
    pub max_witnesses_per_hop: usize,
}

impl SliceCyclesConfig {
    /// Slices packages by `slice_pattern` with the default witness cap.
    #[must_use]
    pub fn new(slice_pattern: impl Into<String>) -> Self {
        Self {
            slice_pattern: slice_pattern.into(),
            max_witnesses_per_hop: DEFAULT_MAX_WITNESSES_PER_HOP,
        }
    }

    /// Sets the witness cap per hop; at least one witness is always kept.
    #[must_use]
    pub fn max_witnesses_per_hop(mut self, max: usize) -> Self {
        self.max_witnesses_per_hop = max.max(1);
        self
    }
}

/// Checks that the slice dependency graph is acyclic.
#[derive(Debug, Clone)]
pub struct SliceCycles {
    meta: RuleMeta,
    config: SliceCyclesConfig,
}

impl SliceCycles {
    /// Creates the rule with the default name.
    #[must_use]
    pub fn new(config: SliceCyclesConfig) -> Self {
        Self {
            meta: RuleMeta::new(NAME),
            config,
        }
    }

    /// Creates the rule with fully specified metadata.
    #[must_use]
    pub fn with_meta(config: SliceCyclesConfig, meta: RuleMeta) -> Self {
        Self { meta, config }
    }

    /// Sets the instance name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.meta = self.meta.with_name(name);
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.meta = self.meta.with_severity(severity);
        self
    }

    /// Sets the rationale shown as help on each violation.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.meta = self.meta.with_rationale(rationale);
        self
    }

    /// Sets a design document reference.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.meta = self.meta.with_doc_ref(doc_ref);
        self
    }
}

impl GraphRule for SliceCycles {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Slices selected by a capture pattern must not depend on each other cyclically"
    }

    fn severity(&self) -> Severity {
        self.meta.severity()
    }

    fn check(&self, graph: &DependencyGraph) -> Result<Vec<Violation>, PatternError> {
        let pattern = PackagePattern::parse_capturing(&self.config.slice_pattern)?;
        let slices = Slices::partition(graph, &pattern);

        // (origin slice, target slice) -> node edges, both keys in name order
        let mut hops: BTreeMap<(usize, usize), Vec<Edge>> = BTreeMap::new();
        for edge in graph.edges() {
            let (Some(from), Some(to)) = (slices.slice_of(edge.origin), slices.slice_of(edge.target))
            else {
                continue;
            };
            if from != to {
                hops.entry((from.index(), to.index())).or_default().push(edge);
            }
        }

        let slice_names: Vec<&str> = slices.ids().map(|id| slices.name(id)).collect();
        let mut adjacency = vec![Vec::new(); slices.len()];
        for &(from, to) in hops.keys() {
            adjacency[from].push(to);
        }

        let mut components: Vec<Vec<usize>> = strongly_connected(&adjacency)
            .into_iter()
            .filter(|c| c.len() > 1)
            .collect();
        for component in &mut components {
            component.sort_unstable();
        }
        components.sort_unstable_by_key(|c| c[0]);

        tracing::debug!(
            rule = self.meta.name(),
            slices = slices.len(),
            slice_edges = hops.len(),
            cycles = components.len(),
            "checking slice cycles"
        );

        let mut violations = Vec::with_capacity(components.len());
        for component in components {
            let mut in_component = vec![false; slices.len()];
            for &s in &component {
                in_component[s] = true;
            }
            let start = component[0];
            let cycle = shortest_cycle(start, &adjacency, &in_component);

            let names: Vec<&str> = cycle.iter().map(|&s| slice_names[s]).collect();
            let message = format!("Cycle detected: {} -> {}", names.join(" -> "), names[0]);

            let mut violation = self.meta.violation(CODE, names[0], message);
            for name in &names[1..] {
                violation = violation.with_implicated(*name);
            }
            for (i, &from) in cycle.iter().enumerate() {
                let to = cycle[(i + 1) % cycle.len()];
                let edges = hops.get(&(from, to)).map_or(&[][..], Vec::as_slice);
                violation = violation.with_witnesses(
                    edges
                        .iter()
                        .take(self.config.max_witnesses_per_hop.max(1))
                        .map(|e| Witness::new(graph.name(e.origin), graph.name(e.target))),
                );
            }
            let violation = violation.with_suggestion(Suggestion::new(
                "Break the cycle by removing or inverting one of the listed dependencies",
            ));
            violations.push(self.meta.decorate(violation));
        }
        Ok(violations)
    }
}

/// Runs a slice-cycle check with default presentation.
///
/// # Errors
///
/// Returns [`PatternError`] if the slice pattern is malformed or has no
/// capture.
pub fn check_slice_cycles(
    graph: &DependencyGraph,
    config: &SliceCyclesConfig,
) -> Result<Vec<Violation>, PatternError> {
    SliceCycles::new(config.clone()).check(graph)
}

const UNVISITED: usize = usize::MAX;

/// Tarjan's strongly connected components without recursion.
///
/// Deep slice chains would otherwise overflow the stack.
fn strongly_connected(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut next_index = 0;
    let mut components = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        // (node, position of the next neighbour to visit)
        let mut frames = vec![(root, 0usize)];
        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            if let Some(&w) = adjacency[v].get(frame.1) {
                frame.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    frames.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}

/// Breadth-first search for the shortest cycle through `start`.
///
/// Returns the cycle without repeating `start` at the end. Neighbours are
/// visited in name order, so ties resolve the same way on every run.
fn shortest_cycle(start: usize, adjacency: &[Vec<usize>], in_component: &[bool]) -> Vec<usize> {
    let mut parent = vec![UNVISITED; adjacency.len()];
    let mut seen = vec![false; adjacency.len()];
    seen[start] = true;
    let mut queue = VecDeque::from([start]);

    while let Some(u) = queue.pop_front() {
        for &v in &adjacency[u] {
            if !in_component[v] {
                continue;
            }
            if v == start {
                let mut path = vec![u];
                let mut current = u;
                while current != start {
                    current = parent[current];
                    path.push(current);
                }
                path.reverse();
                return path;
            }
            if !seen[v] {
                seen[v] = true;
                parent[v] = u;
                queue.push_back(v);
            }
        }
    }
    vec![start]
}
