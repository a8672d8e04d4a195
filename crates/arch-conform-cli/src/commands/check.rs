//! Check command implementation.

use anyhow::{Context, Result};
use arch_conform_core::{create_rules, import, CheckResult, Checker, Config, Severity};
use std::path::PathBuf;

use crate::inputs::ConfigSource;
use crate::OutputFormat;

/// Options of a single `check` invocation.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Dependency graph JSON file.
    pub graph: PathBuf,
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or codes to keep.
    pub rules_filter: Option<String>,
    /// Evaluate rules in parallel.
    pub parallel: bool,
}

/// Runs the check command and reports whether the graph conforms.
pub fn run(source: &ConfigSource, options: &CheckOptions) -> Result<bool> {
    let (result, fail_on) = evaluate(source, options)?;
    super::output::print(&result, options.format, fail_on)?;
    Ok(result.passes(fail_on))
}

fn evaluate(source: &ConfigSource, options: &CheckOptions) -> Result<(CheckResult, Severity)> {
    let config = load_config(source)?;

    let graph = import::load_graph(&options.graph, config.import())
        .map_err(diagnostic)
        .with_context(|| format!("Failed to load graph: {}", options.graph.display()))?;

    let mut builder = Checker::builder()
        .rules(create_rules(&config))
        .parallel(options.parallel);
    if let Some(filter) = &options.rules_filter {
        builder = builder.only(parse_filter(filter));
    }
    let checker = builder.build();

    if checker.rule_count() == 0 {
        tracing::warn!("No rules configured; run `arch-conform init` to create a config");
    }
    tracing::info!(
        "Checking {} with {} rules",
        options.graph.display(),
        checker.rule_count()
    );

    Ok((checker.check(&graph), config.fail_on()))
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    match source {
        ConfigSource::Default => Ok(Config::default()),
        other => {
            // Invariant: non-Default variants always have a path
            let p = other.path().context("resolved config has no path")?;
            if other.is_shared() {
                tracing::info!("Using shared config: {}", p.display());
            }
            Config::from_file(p)
                .map_err(diagnostic)
                .with_context(|| format!("Failed to load config: {}", p.display()))
        }
    }
}

fn parse_filter(filter: &str) -> Vec<&str> {
    filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Renders a diagnostic with its code and help text.
fn diagnostic<E>(error: E) -> anyhow::Error
where
    E: miette::Diagnostic + Send + Sync + 'static,
{
    anyhow::anyhow!("{:?}", miette::Report::new(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../arch-conform-core/tests/fixtures/orca")
            .join(name)
    }

    fn options(graph: PathBuf) -> CheckOptions {
        CheckOptions {
            graph,
            format: OutputFormat::Compact,
            rules_filter: None,
            parallel: true,
        }
    }

    #[test]
    fn fixture_fails_at_error_threshold() {
        let source = ConfigSource::Explicit(fixture("arch-conform.toml"));
        let (result, fail_on) = evaluate(&source, &options(fixture("arch-graph.json"))).unwrap();
        assert_eq!(fail_on, Severity::Error);
        assert_eq!(result.violations.len(), 3);
        assert!(!result.passes(fail_on));
    }

    #[test]
    fn rule_filter_accepts_names_and_codes() {
        let source = ConfigSource::Explicit(fixture("arch-conform.toml"));
        let mut opts = options(fixture("arch-graph.json"));
        opts.rules_filter = Some("AC003, controllers-only-accessed-by-themselves".to_string());

        let (result, _) = evaluate(&source, &opts).unwrap();
        let codes: Vec<&str> = result.violations.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["AC002", "AC003"]);
        assert_eq!(result.rules_checked, 2);
    }

    #[test]
    fn blank_rule_filter_runs_every_rule() {
        let source = ConfigSource::Explicit(fixture("arch-conform.toml"));
        let mut opts = options(fixture("arch-graph.json"));
        opts.rules_filter = Some(" , ".to_string());

        let (result, _) = evaluate(&source, &opts).unwrap();
        assert_eq!(result.rules_checked, 3);
        assert_eq!(result.violations.len(), 3);
    }

    #[test]
    fn default_source_runs_no_rules() {
        let (result, _) = evaluate(&ConfigSource::Default, &options(fixture("arch-graph.json")))
            .unwrap();
        assert_eq!(result.rules_checked, 0);
        assert!(result.passes(Severity::Info));
    }

    #[test]
    fn missing_graph_is_reported_with_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("arch-graph.json");
        let err = evaluate(&ConfigSource::Default, &options(missing)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load graph"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("arch-conform.toml");
        fs::write(
            &config,
            "[[isolate-layer]]\nlayer = \"Missing\"\n",
        )
        .unwrap();

        let err = evaluate(
            &ConfigSource::Project(config),
            &options(fixture("arch-graph.json")),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load config"));
    }

    #[test]
    fn filter_parsing_skips_blanks() {
        assert_eq!(parse_filter(" a, ,AC002,"), vec!["a", "AC002"]);
    }
}
