//! JSON import of dependency graphs produced by an external extractor.
//!
//! ```json
//! {
//!   "units": [
//!     { "name": "com.x.controllers.Ctrl", "package": "com.x.controllers" },
//!     { "name": "com.x.controllers.Ctrl$Inner", "kind": "inner", "enclosing": "com.x.controllers.Ctrl" },
//!     { "name": "com.x.FooTest", "source": "test" }
//!   ],
//!   "dependencies": [{ "origin": "com.x.Service", "target": "com.x.controllers.Ctrl" }]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{DependencyGraph, GraphBuildError, NestingKind, NodeSpec, UnitSource};

/// Which units of an imported graph are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportOptions {
    /// Package prefixes to keep; empty keeps every package.
    pub packages: Vec<String>,
    /// Keep units from test sources.
    pub include_tests: bool,
    /// Keep units from libraries.
    pub include_external: bool,
}

impl ImportOptions {
    /// Tests whether a unit with this package and source is kept.
    #[must_use]
    pub fn keeps(&self, package: &str, source: UnitSource) -> bool {
        let source_kept = match source {
            UnitSource::Main => true,
            UnitSource::Test => self.include_tests,
            UnitSource::External => self.include_external,
        };
        source_kept
            && (self.packages.is_empty()
                || self.packages.iter().any(|prefix| in_package(package, prefix)))
    }
}

/// `package` equals `prefix` or is a sub-package of it.
fn in_package(package: &str, prefix: &str) -> bool {
    package
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

#[derive(Debug, Deserialize)]
struct GraphDto {
    units: Vec<UnitDto>,
    #[serde(default)]
    dependencies: Vec<DependencyDto>,
}

#[derive(Debug, Deserialize)]
struct UnitDto {
    name: String,
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    kind: Option<NestingKind>,
    #[serde(default)]
    enclosing: Option<String>,
    #[serde(default)]
    source: UnitSource,
}

#[derive(Debug, Deserialize)]
struct DependencyDto {
    origin: String,
    target: String,
}

/// Errors while importing a graph.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ImportError {
    /// The graph file could not be read.
    #[error("failed to read graph file {}", path.display())]
    #[diagnostic(code(arch_conform::import::io))]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not a valid graph description.
    #[error("invalid graph document: {0}")]
    #[diagnostic(
        code(arch_conform::import::json),
        help("expected an object with `units` and `dependencies` arrays")
    )]
    Json(#[from] serde_json::Error),

    /// The described graph is inconsistent.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphBuildError),
}

/// Parses a graph document and applies `options`.
///
/// # Errors
///
/// Returns [`ImportError::Json`] for malformed documents and
/// [`ImportError::Graph`] when the graph does not validate.
pub fn parse_graph(json: &str, options: &ImportOptions) -> Result<DependencyGraph, ImportError> {
    let dto: GraphDto = serde_json::from_str(json)?;
    Ok(convert(dto, options)?)
}

/// Reads a graph document from `path` and applies `options`.
///
/// # Errors
///
/// Returns [`ImportError::Io`] when the file cannot be read, otherwise the
/// errors of [`parse_graph`].
pub fn load_graph(path: &Path, options: &ImportOptions) -> Result<DependencyGraph, ImportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "read graph file");
    parse_graph(&content, options)
}

fn convert(dto: GraphDto, options: &ImportOptions) -> Result<DependencyGraph, GraphBuildError> {
    let packages = resolve_packages(&dto.units);
    let known: HashSet<&str> = dto.units.iter().map(|u| u.name.as_str()).collect();
    let kept: HashSet<&str> = dto
        .units
        .iter()
        .filter(|u| options.keeps(&packages[u.name.as_str()], u.source))
        .map(|u| u.name.as_str())
        .collect();

    let mut builder = DependencyGraph::builder();
    for unit in dto.units.iter().filter(|u| kept.contains(u.name.as_str())) {
        let kind = unit.kind.unwrap_or(if unit.enclosing.is_some() {
            NestingKind::Member
        } else {
            NestingKind::TopLevel
        });
        // A link to a dropped unit is cut; a link to a missing one is left for build() to reject
        let enclosing = unit
            .enclosing
            .clone()
            .filter(|e| kept.contains(e.as_str()) || !known.contains(e.as_str()));
        builder = builder.node(
            NodeSpec::new(unit.name.as_str(), packages[unit.name.as_str()].as_str())
                .kind(kind)
                .enclosing(enclosing)
                .source(unit.source),
        );
    }

    let mut dropped_edges = 0usize;
    for dep in &dto.dependencies {
        // An unlisted endpoint is an error even when the other end is filtered out
        if let Some(missing) = [&dep.origin, &dep.target]
            .into_iter()
            .find(|name| !known.contains(name.as_str()))
        {
            return Err(GraphBuildError::DanglingEdge {
                origin: dep.origin.clone(),
                target: dep.target.clone(),
                missing: missing.clone(),
            });
        }
        let excluded = |name: &str| !kept.contains(name);
        if excluded(&dep.origin) || excluded(&dep.target) {
            dropped_edges += 1;
            continue;
        }
        builder = builder.edge(dep.origin.as_str(), dep.target.as_str());
    }

    debug!(
        units = dto.units.len(),
        kept = kept.len(),
        dependencies = dto.dependencies.len(),
        dropped_edges,
        "imported graph document"
    );
    builder.build()
}

/// Resolves each unit's package: explicit, else its enclosing unit's, else
/// the name up to the last `.`.
fn resolve_packages(units: &[UnitDto]) -> HashMap<&str, String> {
    let by_name: HashMap<&str, &UnitDto> = units.iter().map(|u| (u.name.as_str(), u)).collect();
    let mut resolved: HashMap<&str, String> = HashMap::with_capacity(units.len());

    for unit in units {
        if resolved.contains_key(unit.name.as_str()) {
            continue;
        }
        // Walk up until a unit with a known package, bounded against enclosing cycles
        let mut chain = vec![unit];
        let mut package = None;
        let mut current = unit;
        while package.is_none() && chain.len() <= units.len() {
            if let Some(p) = resolved.get(current.name.as_str()) {
                package = Some(p.clone());
            } else if let Some(p) = &current.package {
                package = Some(p.clone());
            } else if let Some(parent) = current.enclosing.as_deref().and_then(|e| by_name.get(e).copied()) {
                current = parent;
                chain.push(parent);
            } else {
                package = Some(package_of_name(&current.name).to_string());
            }
        }
        let package = package.unwrap_or_else(|| package_of_name(&unit.name).to_string());
        for link in chain {
            let own = link.package.clone().unwrap_or_else(|| package.clone());
            resolved.entry(link.name.as_str()).or_insert(own);
        }
    }
    resolved
}

fn package_of_name(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(package, _)| package)
}
