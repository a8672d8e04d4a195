//! Conformance rules driven by TOML configuration.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! dto types
//!   ↓ validate + convert
//! Config (pure domain model)
//!   ↓ create_rules()
//! Vec<RuleBox>
//! ```

use std::path::{Path, PathBuf};

use miette::Diagnostic;

use crate::layer::LayerResolver;
use crate::rule::{RuleBox, RuleMeta};
use crate::rules::{
    Considering, LayerIsolation, LayerIsolationConfig, SelfAccess, SelfAccessConfig, SliceCycles,
    SliceCyclesConfig,
};

pub mod dto;
pub mod loader;
pub mod model;

pub use loader::LoadError;
pub use model::{Config, ConsideringMode, LayerName, ModelError, Presentation};

/// Errors from reading, parsing and validating a configuration file.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(arch_conform::config::io))]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    #[diagnostic(
        code(arch_conform::config::toml),
        help("run `arch-conform init` for a commented example")
    )]
    Toml(#[from] toml::de::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    #[diagnostic(code(arch_conform::config::invalid))]
    Load(#[from] LoadError),
}

impl Config {
    /// Parses and validates TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if TOML parsing or model validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let dto: dto::ConfigDto = toml::from_str(content)?;
        Ok(loader::load(dto)?)
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            layers = config.layers().len(),
            rules = config.rule_count(),
            "loaded config"
        );
        Ok(config)
    }
}

/// Parses TOML content and creates all declared rules.
///
/// Returns `Ok(vec![])` if no rule sections are present.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn load_rules_from_toml(content: &str) -> Result<Vec<RuleBox>, ConfigError> {
    Ok(create_rules(&Config::parse(content)?))
}

/// Creates the rules declared in a validated [`Config`].
///
/// Rules come out grouped by kind (isolate-layer, only-self-access,
/// free-of-cycles), each group in declaration order.
#[must_use]
pub fn create_rules(config: &Config) -> Vec<RuleBox> {
    let mut result: Vec<RuleBox> = Vec::with_capacity(config.rule_count());

    // Origins judged under `considering = "layers"`
    let layered = LayerResolver::new(config.layers().to_vec());

    for decl in config.isolate_layers() {
        // Config::new guarantees the reference resolves
        let Some(layer) = config.layer(&decl.layer) else {
            continue;
        };
        let considering = match decl.considering {
            ConsideringMode::All => Considering::AllDependencies,
            ConsideringMode::Layers => Considering::OnlyLayers(layered.clone()),
        };
        let rule_config = LayerIsolationConfig::new(
            layer.name(),
            layer.patterns().iter().map(|p| p.as_str().to_string()),
        )
        .considering(considering);
        let meta = rule_meta(decl.rule_name(), &decl.presentation);
        result.push(Box::new(LayerIsolation::with_meta(rule_config, meta)));
    }

    for decl in config.self_access() {
        let rule_config = SelfAccessConfig::new(decl.pattern.as_str());
        let meta = rule_meta(decl.name.as_str(), &decl.presentation);
        result.push(Box::new(SelfAccess::with_meta(rule_config, meta)));
    }

    for decl in config.free_of_cycles() {
        let rule_config =
            SliceCyclesConfig::new(decl.slices.as_str()).max_witnesses_per_hop(decl.max_witnesses);
        let meta = rule_meta(decl.name.as_str(), &decl.presentation);
        result.push(Box::new(SliceCycles::with_meta(rule_config, meta)));
    }

    result
}

fn rule_meta(name: impl Into<String>, presentation: &Presentation) -> RuleMeta {
    let mut meta = RuleMeta::new(name).with_severity(presentation.severity);
    if let Some(message) = &presentation.message {
        meta = meta.with_rationale(message.as_str());
    }
    if let Some(doc) = &presentation.doc {
        meta = meta.with_doc_ref(doc.as_str());
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyGraph, NodeSpec};
    use crate::types::Severity;

    const CONFIG: &str = r#"
[[layers]]
name = "Controllers"
packages = ["com.example.controllers"]

[[layers]]
name = "Services"
packages = ["com.example.service"]

[[isolate-layer]]
layer = "Controllers"
considering = "layers"
message = "Controllers are entry points."

[[only-self-access]]
name = "controllers-self-only"
packages = "com.example.controllers"
severity = "warning"

[[free-of-cycles]]
name = "modules-acyclic"
slices = "com.example.(*).."
"#;

    #[test]
    fn creates_rules_in_kind_order() {
        let rules = load_rules_from_toml(CONFIG).unwrap();
        let names: Vec<&str> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec!["Controllers-isolated", "controllers-self-only", "modules-acyclic"]
        );
        assert_eq!(rules[1].severity(), Severity::Warning);
        assert_eq!(rules[2].code(), "AC003");
    }

    #[test]
    fn empty_config_creates_no_rules() {
        assert!(load_rules_from_toml("").unwrap().is_empty());
    }

    #[test]
    fn considering_layers_ignores_unlayered_origins() {
        let graph = DependencyGraph::builder()
            .node(NodeSpec::new("com.example.controllers.C", "com.example.controllers"))
            .node(NodeSpec::new("com.example.service.S", "com.example.service"))
            .node(NodeSpec::new("com.example.util.U", "com.example.util"))
            .edge("com.example.service.S", "com.example.controllers.C")
            .edge("com.example.util.U", "com.example.controllers.C")
            .build()
            .unwrap();
        let rules = load_rules_from_toml(CONFIG).unwrap();
        let violations = rules[0].check(&graph).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].implicated, vec!["com.example.service.S".to_string()]);
        assert_eq!(
            violations[0].suggestion.as_ref().map(|s| s.message.as_str()),
            Some("Controllers are entry points.")
        );
    }

    #[test]
    fn toml_syntax_error() {
        let err = Config::parse("[[layers]\nname=").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/arch-conform.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
