//! Pure domain model for conformance configuration.
//!
//! This module contains no serde and no I/O. All invariants are enforced at
//! construction time via validated newtypes and [`Config::new`].

use std::collections::HashSet;
use std::fmt;

use crate::import::ImportOptions;
use crate::layer::Layer;
use crate::pattern::PackagePattern;
use crate::types::Severity;

// ────────────────────────────────────────────
// Newtypes with validation
// ────────────────────────────────────────────

/// A validated layer name (non-empty, `[A-Za-z0-9_-]` only).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerName(String);

impl LayerName {
    /// Creates a new layer name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or contains invalid characters.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyLayerName);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ModelError::InvalidLayerName {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ────────────────────────────────────────────
// Rule declarations
// ────────────────────────────────────────────

/// Presentation settings shared by every rule declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    /// Severity of produced violations.
    pub severity: Severity,
    /// Rationale shown with each violation.
    pub message: Option<String>,
    /// Document reference.
    pub doc: Option<String>,
}

/// Which origins an isolate-layer rule judges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsideringMode {
    /// Every origin.
    #[default]
    All,
    /// Only origins inside some configured layer.
    Layers,
}

/// A declared isolate-layer rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolateLayerDecl {
    /// Explicit rule name.
    pub name: Option<String>,
    /// The isolated layer.
    pub layer: LayerName,
    /// Which origins are judged.
    pub considering: ConsideringMode,
    /// Presentation settings.
    pub presentation: Presentation,
}

impl IsolateLayerDecl {
    /// Returns the explicit name or `<layer>-isolated`.
    #[must_use]
    pub fn rule_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}-isolated", self.layer))
    }
}

/// A declared only-self-access rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfAccessDecl {
    /// Rule name.
    pub name: String,
    /// Pattern of guarded units.
    pub pattern: PackagePattern,
    /// Presentation settings.
    pub presentation: Presentation,
}

/// A declared free-of-cycles rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeOfCyclesDecl {
    /// Rule name.
    pub name: String,
    /// Capturing slice pattern.
    pub slices: PackagePattern,
    /// Witness cap per cycle hop.
    pub max_witnesses: usize,
    /// Presentation settings.
    pub presentation: Presentation,
}

// ────────────────────────────────────────────
// Aggregate root
// ────────────────────────────────────────────

/// Validated conformance configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    fail_on: Severity,
    import: ImportOptions,
    layers: Vec<Layer>,
    isolate_layers: Vec<IsolateLayerDecl>,
    self_access: Vec<SelfAccessDecl>,
    free_of_cycles: Vec<FreeOfCyclesDecl>,
}

impl Default for Config {
    fn default() -> Self {
        Self::empty()
    }
}

impl Config {
    /// Creates a config with full cross-reference validation.
    ///
    /// # Errors
    ///
    /// Returns every duplicate layer, unknown layer reference and duplicate
    /// rule name found.
    pub fn new(
        fail_on: Severity,
        import: ImportOptions,
        layers: Vec<Layer>,
        isolate_layers: Vec<IsolateLayerDecl>,
        self_access: Vec<SelfAccessDecl>,
        free_of_cycles: Vec<FreeOfCyclesDecl>,
    ) -> Result<Self, Vec<ModelError>> {
        let mut errors = Vec::new();

        let mut layer_names = HashSet::new();
        for layer in &layers {
            if !layer_names.insert(layer.name()) {
                errors.push(ModelError::DuplicateLayer {
                    name: layer.name().to_string(),
                });
            }
        }

        for (i, rule) in isolate_layers.iter().enumerate() {
            if !layer_names.contains(rule.layer.as_str()) {
                errors.push(ModelError::UnknownLayer {
                    context: format!("isolate-layer[{i}].layer"),
                    name: rule.layer.clone(),
                });
            }
        }

        let mut rule_names = HashSet::new();
        let names = isolate_layers
            .iter()
            .map(IsolateLayerDecl::rule_name)
            .chain(self_access.iter().map(|r| r.name.clone()))
            .chain(free_of_cycles.iter().map(|r| r.name.clone()));
        for name in names {
            if !rule_names.insert(name.clone()) {
                errors.push(ModelError::DuplicateRuleName { name });
            }
        }

        if errors.is_empty() {
            Ok(Self {
                fail_on,
                import,
                layers,
                isolate_layers,
                self_access,
                free_of_cycles,
            })
        } else {
            Err(errors)
        }
    }

    /// Creates an empty config (no rules, fail on errors).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            fail_on: Severity::Error,
            import: ImportOptions::default(),
            layers: Vec::new(),
            isolate_layers: Vec::new(),
            self_access: Vec::new(),
            free_of_cycles: Vec::new(),
        }
    }

    /// Returns the lowest severity that fails a check.
    #[must_use]
    pub fn fail_on(&self) -> Severity {
        self.fail_on
    }

    /// Returns the graph import options.
    #[must_use]
    pub fn import(&self) -> &ImportOptions {
        &self.import
    }

    /// Returns the declared layers.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Looks up a layer by name.
    #[must_use]
    pub fn layer(&self, name: &LayerName) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name.as_str())
    }

    /// Returns the isolate-layer declarations.
    #[must_use]
    pub fn isolate_layers(&self) -> &[IsolateLayerDecl] {
        &self.isolate_layers
    }

    /// Returns the only-self-access declarations.
    #[must_use]
    pub fn self_access(&self) -> &[SelfAccessDecl] {
        &self.self_access
    }

    /// Returns the free-of-cycles declarations.
    #[must_use]
    pub fn free_of_cycles(&self) -> &[FreeOfCyclesDecl] {
        &self.free_of_cycles
    }

    /// Returns the number of declared rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.isolate_layers.len() + self.self_access.len() + self.free_of_cycles.len()
    }

    /// Returns true if no rule is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }
}

/// Validation errors in the domain model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Layer name is empty.
    #[error("layer name must not be empty")]
    EmptyLayerName,

    /// Layer name contains invalid characters.
    #[error("invalid layer name `{name}`: must be [A-Za-z0-9_-]")]
    InvalidLayerName {
        /// The invalid name.
        name: String,
    },

    /// Two layers share a name.
    #[error("layer `{name}` is defined more than once")]
    DuplicateLayer {
        /// The repeated name.
        name: String,
    },

    /// A layer reference points to an undefined layer.
    #[error("{context}: unknown layer `{name}`")]
    UnknownLayer {
        /// Where the reference was found.
        context: String,
        /// The undefined layer name.
        name: LayerName,
    },

    /// Two rules share an instance name.
    #[error("rule name `{name}` is used more than once")]
    DuplicateRuleName {
        /// The repeated name.
        name: String,
    },
}
