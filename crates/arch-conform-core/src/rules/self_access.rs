//! Rule that lets a unit be accessed only by itself.
//!
//! # Rationale
//!
//! Some units are wired up by a framework and must never be referenced
//! directly: configuration classes, entry points, generated glue. Code
//! nested inside such a unit counts as the unit itself, so helpers and
//! anonymous callbacks declared within it may still reach it.
//!
//! # Detected Patterns
//!
//! - A dependency on a matching unit whose origin, resolved to its outermost
//!   enclosing unit, is a different unit.

use std::collections::BTreeMap;

use crate::containment::ContainmentResolver;
use crate::graph::{DependencyGraph, NodeId};
use crate::pattern::{PackagePattern, PatternError};
use crate::rule::{GraphRule, RuleMeta};
use crate::types::{Severity, Violation, Witness};

/// Rule code for self-access.
pub const CODE: &str = "AC002";

/// Rule name for self-access.
pub const NAME: &str = "self-access";

/// Configuration of a self-access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfAccessConfig {
    /// Package pattern selecting the guarded units.
    pub pattern: String,
}

impl SelfAccessConfig {
    /// Guards every unit whose package matches `pattern`.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

/// Checks that matching units are only accessed from within themselves.
#[derive(Debug, Clone)]
pub struct SelfAccess {
    meta: RuleMeta,
    config: SelfAccessConfig,
}

impl SelfAccess {
    /// Creates the rule with the default name.
    #[must_use]
    pub fn new(config: SelfAccessConfig) -> Self {
        Self {
            meta: RuleMeta::new(NAME),
            config,
        }
    }

    /// Creates the rule with fully specified metadata.
    #[must_use]
    pub fn with_meta(config: SelfAccessConfig, meta: RuleMeta) -> Self {
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

impl GraphRule for SelfAccess {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Matching units may only be accessed by themselves or code nested in them"
    }

    fn severity(&self) -> Severity {
        self.meta.severity()
    }

    fn check(&self, graph: &DependencyGraph) -> Result<Vec<Violation>, PatternError> {
        let pattern = PackagePattern::parse(&self.config.pattern)?;
        let resolver = ContainmentResolver::new(graph);

        let guarded: Vec<NodeId> = graph
            .node_ids()
            .filter(|&id| pattern.matches(graph.node(id).package()))
            .collect();
        tracing::debug!(
            rule = self.meta.name(),
            pattern = %pattern,
            guarded = guarded.len(),
            "checking self access"
        );

        let mut violations = Vec::new();
        for unit in guarded {
            let home = resolver.resolve_origin(unit);

            // Effective origin -> concrete origins collapsed into it
            let mut accessors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
            for &origin in graph.incoming(unit) {
                let effective = resolver.resolve_origin(origin);
                if effective != home {
                    accessors.entry(effective).or_default().push(origin);
                }
            }

            for (effective, origins) in accessors {
                let message = format!(
                    "Unit {} should only be accessed by itself, but is accessed by {}",
                    graph.name(unit),
                    graph.name(effective)
                );
                let violation = self
                    .meta
                    .violation(CODE, graph.name(unit), message)
                    .with_implicated(graph.name(effective))
                    .with_witnesses(
                        origins
                            .into_iter()
                            .map(|o| Witness::new(graph.name(o), graph.name(unit))),
                    );
                violations.push(self.meta.decorate(violation));
            }
        }
        Ok(violations)
    }
}

/// Runs a self-access check with default presentation.
///
/// # Errors
///
/// Returns [`PatternError`] if the unit pattern is malformed.
pub fn check_self_access(
    graph: &DependencyGraph,
    config: &SelfAccessConfig,
) -> Result<Vec<Violation>, PatternError> {
    SelfAccess::new(config.clone()).check(graph)
}
