//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::Deserialize;

use crate::import::ImportOptions;
use crate::rules::slice_cycles::DEFAULT_MAX_WITNESSES_PER_HOP;

/// Raw TOML representation of an `arch-conform.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDto {
    /// Lowest severity that fails a check (default: "error").
    #[serde(default = "default_severity_str")]
    pub fail_on: String,

    /// Graph import options.
    #[serde(default)]
    pub import: ImportOptions,

    /// Named layer definitions.
    #[serde(default)]
    pub layers: Vec<LayerDto>,

    /// Layer isolation rules.
    #[serde(rename = "isolate-layer", default)]
    pub isolate_layer: Vec<IsolateLayerDto>,

    /// Self-access rules.
    #[serde(rename = "only-self-access", default)]
    pub only_self_access: Vec<SelfAccessDto>,

    /// Slice acyclicity rules.
    #[serde(rename = "free-of-cycles", default)]
    pub free_of_cycles: Vec<FreeOfCyclesDto>,
}

/// TOML representation of a named layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDto {
    /// Layer name (e.g., "Controllers").
    pub name: String,
    /// Package patterns.
    pub packages: Vec<String>,
}

/// TOML representation of an isolate-layer rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IsolateLayerDto {
    /// Optional rule name (default: "<layer>-isolated").
    #[serde(default)]
    pub name: Option<String>,
    /// Name of the layer to isolate.
    pub layer: String,
    /// "all" or "layers" (default: "all").
    #[serde(default = "default_considering_str")]
    pub considering: String,
    /// Rationale shown with each violation.
    #[serde(default)]
    pub message: Option<String>,
    /// Document reference.
    #[serde(default)]
    pub doc: Option<String>,
    /// Severity (default: "error").
    #[serde(default = "default_severity_str")]
    pub severity: String,
}

/// TOML representation of an only-self-access rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelfAccessDto {
    /// Rule name.
    pub name: String,
    /// Package pattern of the guarded units.
    pub packages: String,
    /// Rationale shown with each violation.
    #[serde(default)]
    pub message: Option<String>,
    /// Document reference.
    #[serde(default)]
    pub doc: Option<String>,
    /// Severity (default: "error").
    #[serde(default = "default_severity_str")]
    pub severity: String,
}

/// TOML representation of a free-of-cycles rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FreeOfCyclesDto {
    /// Rule name.
    pub name: String,
    /// Slice pattern with one `(*)` capture.
    pub slices: String,
    /// Witness cap per cycle hop.
    #[serde(default = "default_max_witnesses")]
    pub max_witnesses: usize,
    /// Rationale shown with each violation.
    #[serde(default)]
    pub message: Option<String>,
    /// Document reference.
    #[serde(default)]
    pub doc: Option<String>,
    /// Severity (default: "error").
    #[serde(default = "default_severity_str")]
    pub severity: String,
}

fn default_severity_str() -> String {
    "error".to_string()
}

fn default_considering_str() -> String {
    "all".to_string()
}

fn default_max_witnesses() -> usize {
    DEFAULT_MAX_WITNESSES_PER_HOP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let dto: ConfigDto = toml::from_str("").unwrap();
        assert_eq!(dto.fail_on, "error");
        assert!(dto.layers.is_empty());
        assert!(dto.isolate_layer.is_empty());
        assert!(dto.only_self_access.is_empty());
        assert!(dto.free_of_cycles.is_empty());
        assert_eq!(dto.import, ImportOptions::default());
    }

    #[test]
    fn deserialize_full_config() {
        let toml_str = r#"
fail_on = "warning"

[import]
packages = ["com.netflix.spinnaker.orca"]
include_tests = true

[[layers]]
name = "Controllers"
packages = ["com.netflix.spinnaker.orca.controllers"]

[[isolate-layer]]
layer = "Controllers"
message = "Controllers are entry points."

[[only-self-access]]
name = "controllers-only-accessed-by-themselves"
packages = "com.netflix.spinnaker.orca.controllers"
severity = "warning"

[[free-of-cycles]]
name = "slices-free-of-cycles"
slices = "com.netflix.spinnaker.orca.(*).."
max_witnesses = 5
"#;
        let dto: ConfigDto = toml::from_str(toml_str).unwrap();
        assert_eq!(dto.fail_on, "warning");
        assert!(dto.import.include_tests);
        assert!(!dto.import.include_external);
        assert_eq!(dto.layers.len(), 1);
        assert_eq!(dto.isolate_layer[0].considering, "all");
        assert_eq!(dto.isolate_layer[0].severity, "error");
        assert!(dto.isolate_layer[0].name.is_none());
        assert_eq!(dto.only_self_access[0].severity, "warning");
        assert_eq!(dto.free_of_cycles[0].max_witnesses, 5);
    }

    #[test]
    fn default_witness_cap() {
        let dto: ConfigDto = toml::from_str(
            r#"
[[free-of-cycles]]
name = "cycles"
slices = "app.(*).."
"#,
        )
        .unwrap();
        assert_eq!(dto.free_of_cycles[0].max_witnesses, 20);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<ConfigDto, _> = toml::from_str(
            r#"
[[layers]]
name = "Controllers"
package = ["typo"]
"#,
        );
        assert!(result.is_err());
    }
}
