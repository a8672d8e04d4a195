//! # arch-conform-core
//!
//! Architecture conformance checks over a static dependency graph of code
//! units.
//!
//! This crate provides:
//!
//! - [`DependencyGraph`] built with [`GraphBuilder`] or imported from JSON
//!   via [`import::load_graph`]
//! - [`PackagePattern`] for selecting units by package
//! - [`GraphRule`] and the built-in rules in [`rules`]: layer isolation,
//!   self-access and slice acyclicity
//! - [`Checker`] for running rules (optionally in parallel)
//! - [`Config`] for declaring rules in TOML
//!
//! ## Example
//!
//! ```ignore
//! use arch_conform_core::rules::{LayerIsolation, LayerIsolationConfig, SliceCycles, SliceCyclesConfig};
//! use arch_conform_core::{import, Checker, Severity};
//!
//! let graph = import::load_graph("arch-graph.json".as_ref(), &Default::default())?;
//! let result = Checker::builder()
//!     .rule(LayerIsolation::new(LayerIsolationConfig::new(
//!         "Controllers",
//!         ["com.example.controllers.."],
//!     )))
//!     .rule(SliceCycles::new(SliceCyclesConfig::new("com.example.(*)..")))
//!     .build()
//!     .check(&graph);
//!
//! assert!(result.passes(Severity::Error), "{}", result.format_test_report(Severity::Error));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod checker;
mod rule;
mod types;

pub mod config;
pub mod containment;
pub mod graph;
pub mod import;
pub mod layer;
pub mod pattern;
pub mod rules;
pub mod slices;

pub use checker::{Checker, CheckerBuilder};
pub use config::{create_rules, load_rules_from_toml, Config, ConfigError};
pub use containment::{resolve_origin, ContainmentResolver};
pub use graph::{
    DependencyGraph, Edge, GraphBuildError, GraphBuilder, NestingKind, Node, NodeId, NodeSpec,
    UnitSource,
};
pub use import::{ImportError, ImportOptions};
pub use layer::{Layer, LayerResolver};
pub use pattern::{PackagePattern, PatternError};
pub use rule::{GraphRule, RuleBox, RuleMeta};
pub use slices::{SliceId, Slices};
pub use types::{CheckResult, RuleFailure, Severity, Suggestion, Violation, Witness};
