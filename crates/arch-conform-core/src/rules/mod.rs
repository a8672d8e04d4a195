//! Built-in conformance rules.
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | AC001 | `layer-isolation` | No unit outside a layer may depend on a unit inside it |
//! | AC002 | `self-access` | Matching units may only be accessed by themselves |
//! | AC003 | `slice-cycles` | Slices must be free of dependency cycles |

pub mod layer_isolation;
pub mod self_access;
pub mod slice_cycles;

pub use layer_isolation::{check_layer_isolation, Considering, LayerIsolation, LayerIsolationConfig};
pub use self_access::{check_self_access, SelfAccess, SelfAccessConfig};
pub use slice_cycles::{check_slice_cycles, SliceCycles, SliceCyclesConfig};

/// Catalog entry describing a built-in rule kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RuleInfo {
    /// Rule code.
    pub code: &'static str,
    /// Rule kind name.
    pub name: &'static str,
    /// Configuration table that declares instances of the rule.
    pub table: &'static str,
    /// Short description.
    pub description: &'static str,
}

/// Returns the catalog of built-in rule kinds.
#[must_use]
pub fn builtin_rules() -> &'static [RuleInfo] {
    const RULES: &[RuleInfo] = &[
        RuleInfo {
            code: layer_isolation::CODE,
            name: layer_isolation::NAME,
            table: "isolate-layer",
            description: "No unit outside a layer may depend on a unit inside it",
        },
        RuleInfo {
            code: self_access::CODE,
            name: self_access::NAME,
            table: "only-self-access",
            description: "Matching units may only be accessed by themselves or code nested in them",
        },
        RuleInfo {
            code: slice_cycles::CODE,
            name: slice_cycles::NAME,
            table: "free-of-cycles",
            description: "Slices selected by a capture pattern must be free of dependency cycles",
        },
    ];
    RULES
}
