//! Layers: named node groups defined by package patterns.

use crate::graph::{DependencyGraph, Node};
use crate::pattern::{PackagePattern, PatternError};

/// A named architecture layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    patterns: Vec<PackagePattern>,
}

impl Layer {
    /// Creates a layer from already parsed patterns.
    #[must_use]
    pub fn new(name: impl Into<String>, patterns: Vec<PackagePattern>) -> Self {
        Self {
            name: name.into(),
            patterns,
        }
    }

    /// Creates a layer by parsing each pattern.
    ///
    /// # Errors
    ///
    /// Returns the first [`PatternError`] encountered.
    pub fn parse<S: AsRef<str>>(name: impl Into<String>, patterns: &[S]) -> Result<Self, PatternError> {
        Ok(Self::new(name, crate::pattern::parse_all(patterns)?))
    }

    /// Returns the layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the package patterns.
    #[must_use]
    pub fn patterns(&self) -> &[PackagePattern] {
        &self.patterns
    }

    /// Tests whether a node's package belongs to this layer.
    #[must_use]
    pub fn contains(&self, node: &Node) -> bool {
        self.patterns.iter().any(|p| p.matches(node.package()))
    }

    /// Returns a membership flag per node, indexed by [`crate::graph::NodeId::index`].
    #[must_use]
    pub fn membership(&self, graph: &DependencyGraph) -> Vec<bool> {
        graph.nodes().iter().map(|n| self.contains(n)).collect()
    }
}

/// Maps packages to the first declared layer whose patterns match.
///
/// Layers may overlap; declaration order decides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerResolver {
    layers: Vec<Layer>,
}

impl LayerResolver {
    /// Builds a resolver over the given layers.
    #[must_use]
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// Which layer does this package belong to?
    #[must_use]
    pub fn resolve(&self, package: &str) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.patterns.iter().any(|p| p.matches(package)))
            .map(Layer::name)
    }

    /// Returns the layer of a node.
    #[must_use]
    pub fn layer_of(&self, node: &Node) -> Option<&str> {
        self.resolve(node.package())
    }
}
