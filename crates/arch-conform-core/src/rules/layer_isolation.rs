//! Rule that forbids any access into a layer from outside it.
//!
//! # Rationale
//!
//! Some layers are entry points: controllers, CLI front ends, message
//! listeners. Nothing else in the system should call into them, otherwise
//! the entry point turns into a shared library and every change to it ripples
//! through unrelated code.
//!
//! # Detected Patterns
//!
//! - A dependency whose target lies in the isolated layer and whose origin
//!   lies outside it.
//!
//! Dependencies between two members of the layer are always allowed.

use crate::graph::DependencyGraph;
use crate::layer::{Layer, LayerResolver};
use crate::pattern::PatternError;
use crate::rule::{GraphRule, RuleMeta};
use crate::types::{Severity, Violation, Witness};

/// Rule code for layer-isolation.
pub const CODE: &str = "AC001";

/// Rule name for layer-isolation.
pub const NAME: &str = "layer-isolation";

/// Which origins are judged by the rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Considering {
    /// Every dependency into the layer counts.
    #[default]
    AllDependencies,
    /// Only origins that belong to one of these layers count.
    OnlyLayers(LayerResolver),
}

/// Configuration of a layer-isolation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerIsolationConfig {
    /// Name of the isolated layer.
    pub layer_name: String,
    /// Package patterns defining the layer.
    pub layer_patterns: Vec<String>,
    /// Which origins are judged.
    pub considering: Considering,
}

impl LayerIsolationConfig {
    /// Isolates the layer `name` defined by `patterns`, considering all origins.
    #[must_use]
    pub fn new<S: Into<String>>(name: impl Into<String>, patterns: impl IntoIterator<Item = S>) -> Self {
        Self {
            layer_name: name.into(),
            layer_patterns: patterns.into_iter().map(Into::into).collect(),
            considering: Considering::AllDependencies,
        }
    }

    /// Restricts the judged origins.
    #[must_use]
    pub fn considering(mut self, considering: Considering) -> Self {
        self.considering = considering;
        self
    }
}

/// Checks that no unit outside a layer depends on a unit inside it.
#[derive(Debug, Clone)]
pub struct LayerIsolation {
    meta: RuleMeta,
    config: LayerIsolationConfig,
}

impl LayerIsolation {
    /// Creates the rule named after the layer.
    #[must_use]
    pub fn new(config: LayerIsolationConfig) -> Self {
        let meta = RuleMeta::new(format!("{}-isolated", config.layer_name));
        Self { meta, config }
    }

    /// Creates the rule with fully specified metadata.
    #[must_use]
    pub fn with_meta(config: LayerIsolationConfig, meta: RuleMeta) -> Self {
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

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LayerIsolationConfig {
        &self.config
    }
}

impl GraphRule for LayerIsolation {
    fn name(&self) -> &str {
        self.meta.name()
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids dependencies into a layer from outside it"
    }

    fn severity(&self) -> Severity {
        self.meta.severity()
    }

    fn check(&self, graph: &DependencyGraph) -> Result<Vec<Violation>, PatternError> {
        let layer = Layer::parse(self.config.layer_name.as_str(), &self.config.layer_patterns)?;
        let in_layer = layer.membership(graph);

        tracing::debug!(
            rule = self.meta.name(),
            layer = layer.name(),
            members = in_layer.iter().filter(|m| **m).count(),
            "checking layer isolation"
        );

        let mut violations = Vec::new();
        for target in graph.node_ids().filter(|id| in_layer[id.index()]) {
            for &origin in graph.incoming(target) {
                if in_layer[origin.index()] {
                    continue;
                }
                let origin_node = graph.node(origin);
                if let Considering::OnlyLayers(layers) = &self.config.considering {
                    if layers.layer_of(origin_node).is_none() {
                        continue;
                    }
                }
                let message = format!(
                    "Layer '{}' may not be accessed by any layer, but {} depends on {}",
                    layer.name(),
                    origin_node.name(),
                    graph.name(target)
                );
                let violation = self
                    .meta
                    .violation(CODE, graph.name(target), message)
                    .with_implicated(origin_node.name())
                    .with_witness(Witness::new(origin_node.name(), graph.name(target)));
                violations.push(self.meta.decorate(violation));
            }
        }
        Ok(violations)
    }
}

/// Runs a layer-isolation check with default presentation.
///
/// # Errors
///
/// Returns [`PatternError`] if a layer pattern is malformed.
pub fn check_layer_isolation(
    graph: &DependencyGraph,
    config: &LayerIsolationConfig,
) -> Result<Vec<Violation>, PatternError> {
    LayerIsolation::new(config.clone()).check(graph)
}
