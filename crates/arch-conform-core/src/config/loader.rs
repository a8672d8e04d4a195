//! DTO → Domain model conversion with validation.

use crate::layer::Layer;
use crate::pattern::{PackagePattern, PatternError};
use crate::types::Severity;

use super::dto::{ConfigDto, FreeOfCyclesDto, IsolateLayerDto, LayerDto, SelfAccessDto};
use super::model::{
    Config, ConsideringMode, FreeOfCyclesDecl, IsolateLayerDecl, LayerName, ModelError,
    Presentation, SelfAccessDecl,
};

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "layers[0].name").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// A package pattern failed to parse.
    #[error("{context}: {source}")]
    Pattern {
        /// Where the pattern was found (e.g., "layers[0].packages[1]").
        context: String,
        /// The underlying pattern error.
        source: PatternError,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warning, info")]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Unknown `considering` value.
    #[error("{context}: unknown considering mode `{value}`, expected: all, layers")]
    UnknownConsidering {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// A witness cap of zero would hide the dependencies behind a cycle.
    #[error("{context}: must be at least 1")]
    ZeroWitnessCap {
        /// Where the error occurred.
        context: String,
    },

    /// A layer without package patterns.
    #[error("{context}: a layer needs at least one package pattern")]
    EmptyLayer {
        /// Where the error occurred.
        context: String,
    },

    /// Cross-reference errors from aggregate root construction.
    #[error("configuration validation errors:\n{}", format_errors(.0))]
    CrossRef(Vec<ModelError>),
}

fn format_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts a [`ConfigDto`] to a validated [`Config`].
///
/// # Errors
///
/// Returns the first field-level error encountered, or every
/// cross-reference error at once.
pub fn load(dto: ConfigDto) -> Result<Config, LoadError> {
    let fail_on = parse_severity(&dto.fail_on, "fail_on")?;

    let layers = dto
        .layers
        .iter()
        .enumerate()
        .map(|(i, l)| convert_layer(l, i))
        .collect::<Result<Vec<_>, _>>()?;

    let isolate_layers = dto
        .isolate_layer
        .into_iter()
        .enumerate()
        .map(|(i, r)| convert_isolate_layer(r, i))
        .collect::<Result<Vec<_>, _>>()?;

    let self_access = dto
        .only_self_access
        .into_iter()
        .enumerate()
        .map(|(i, r)| convert_self_access(r, i))
        .collect::<Result<Vec<_>, _>>()?;

    let free_of_cycles = dto
        .free_of_cycles
        .into_iter()
        .enumerate()
        .map(|(i, r)| convert_free_of_cycles(r, i))
        .collect::<Result<Vec<_>, _>>()?;

    Config::new(
        fail_on,
        dto.import,
        layers,
        isolate_layers,
        self_access,
        free_of_cycles,
    )
    .map_err(LoadError::CrossRef)
}

fn convert_layer(dto: &LayerDto, index: usize) -> Result<Layer, LoadError> {
    let ctx = format!("layers[{index}]");
    let name = LayerName::new(&dto.name).map_err(|e| LoadError::Validation {
        context: format!("{ctx}.name"),
        source: e,
    })?;
    if dto.packages.is_empty() {
        return Err(LoadError::EmptyLayer {
            context: format!("{ctx}.packages"),
        });
    }

    let patterns = dto
        .packages
        .iter()
        .enumerate()
        .map(|(j, p)| parse_pattern(p, format!("{ctx}.packages[{j}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Layer::new(name.as_str(), patterns))
}

fn convert_isolate_layer(dto: IsolateLayerDto, index: usize) -> Result<IsolateLayerDecl, LoadError> {
    let ctx = format!("isolate-layer[{index}]");
    let layer = LayerName::new(&dto.layer).map_err(|e| LoadError::Validation {
        context: format!("{ctx}.layer"),
        source: e,
    })?;
    let considering = match dto.considering.as_str() {
        "all" => ConsideringMode::All,
        "layers" => ConsideringMode::Layers,
        other => {
            return Err(LoadError::UnknownConsidering {
                context: format!("{ctx}.considering"),
                value: other.to_string(),
            })
        }
    };
    let severity = parse_severity(&dto.severity, &format!("{ctx}.severity"))?;

    Ok(IsolateLayerDecl {
        name: dto.name,
        layer,
        considering,
        presentation: Presentation {
            severity,
            message: dto.message,
            doc: dto.doc,
        },
    })
}

fn convert_self_access(dto: SelfAccessDto, index: usize) -> Result<SelfAccessDecl, LoadError> {
    let ctx = format!("only-self-access[{index}]");
    let pattern = parse_pattern(&dto.packages, format!("{ctx}.packages"))?;
    let severity = parse_severity(&dto.severity, &format!("{ctx}.severity"))?;

    Ok(SelfAccessDecl {
        name: dto.name,
        pattern,
        presentation: Presentation {
            severity,
            message: dto.message,
            doc: dto.doc,
        },
    })
}

fn convert_free_of_cycles(dto: FreeOfCyclesDto, index: usize) -> Result<FreeOfCyclesDecl, LoadError> {
    let ctx = format!("free-of-cycles[{index}]");
    let slices = PackagePattern::parse_capturing(&dto.slices).map_err(|e| LoadError::Pattern {
        context: format!("{ctx}.slices"),
        source: e,
    })?;
    if dto.max_witnesses == 0 {
        return Err(LoadError::ZeroWitnessCap {
            context: format!("{ctx}.max_witnesses"),
        });
    }
    let severity = parse_severity(&dto.severity, &format!("{ctx}.severity"))?;

    Ok(FreeOfCyclesDecl {
        name: dto.name,
        slices,
        max_witnesses: dto.max_witnesses,
        presentation: Presentation {
            severity,
            message: dto.message,
            doc: dto.doc,
        },
    })
}

fn parse_pattern(raw: &str, context: String) -> Result<PackagePattern, LoadError> {
    PackagePattern::parse(raw).map_err(|e| LoadError::Pattern { context, source: e })
}

fn parse_severity(s: &str, context: &str) -> Result<Severity, LoadError> {
    match s {
        "error" => Ok(Severity::Error),
        "warning" => Ok(Severity::Warning),
        "info" => Ok(Severity::Info),
        _ => Err(LoadError::UnknownSeverity {
            context: context.to_string(),
            value: s.to_string(),
        }),
    }
}
