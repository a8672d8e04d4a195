//! Runs a set of rules over one dependency graph.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::graph::DependencyGraph;
use crate::rule::{GraphRule, RuleBox};
use crate::types::{CheckResult, RuleFailure, Violation};

/// Builder for configuring a [`Checker`].
pub struct CheckerBuilder {
    rules: Vec<RuleBox>,
    only: Option<Vec<String>>,
    parallel: bool,
}

impl Default for CheckerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            only: None,
            parallel: true,
        }
    }

    /// Adds a rule to the checker.
    #[must_use]
    pub fn rule<R: GraphRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the checker.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Keeps only rules whose instance name or code is listed.
    ///
    /// An empty list keeps every rule.
    #[must_use]
    pub fn only<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(selectors.into_iter().map(Into::into).collect());
        self
    }

    /// Sets whether rules run on the rayon thread pool (default: true).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builds the checker.
    #[must_use]
    pub fn build(self) -> Checker {
        let rules = match self.only {
            None => self.rules,
            Some(selectors) if selectors.is_empty() => {
                warn!("empty rule filter; running every rule");
                self.rules
            }
            Some(selectors) => {
                let selected: HashSet<&str> = selectors.iter().map(String::as_str).collect();
                for selector in &selectors {
                    let known = self
                        .rules
                        .iter()
                        .any(|r| r.name() == selector.as_str() || r.code() == selector.as_str());
                    if !known {
                        warn!(selector = %selector, "no configured rule matches filter");
                    }
                }
                self.rules
                    .into_iter()
                    .filter(|r| selected.contains(r.name()) || selected.contains(r.code()))
                    .collect()
            }
        };

        Checker {
            rules,
            parallel: self.parallel,
        }
    }
}

/// Evaluates rules over a frozen [`DependencyGraph`].
///
/// Use [`Checker::builder()`] to construct an instance. Results keep rule
/// order whether or not rules run in parallel.
pub struct Checker {
    rules: Vec<RuleBox>,
    parallel: bool,
}

impl Checker {
    /// Creates a new builder for configuring a checker.
    #[must_use]
    pub fn builder() -> CheckerBuilder {
        CheckerBuilder::new()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the registered rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RuleBox] {
        &self.rules
    }

    /// Runs every rule and collects violations and failures.
    #[must_use]
    pub fn check(&self, graph: &DependencyGraph) -> CheckResult {
        info!(
            rules = self.rules.len(),
            units = graph.len(),
            dependencies = graph.edge_count(),
            "starting conformance check"
        );

        let outcomes: Vec<Result<Vec<Violation>, RuleFailure>> = if self.parallel {
            self.rules.par_iter().map(|r| run_rule(r.as_ref(), graph)).collect()
        } else {
            self.rules.iter().map(|r| run_rule(r.as_ref(), graph)).collect()
        };

        let mut result = CheckResult::new();
        result.rules_checked = self.rules.len();
        result.nodes_checked = graph.len();
        for outcome in outcomes {
            match outcome {
                Ok(violations) => result.violations.extend(violations),
                Err(failure) => result.failures.push(failure),
            }
        }

        let (errors, warnings, infos) = result.count_by_severity();
        info!(
            errors,
            warnings,
            infos,
            failures = result.failures.len(),
            "conformance check complete"
        );
        result
    }
}

fn run_rule(rule: &dyn GraphRule, graph: &DependencyGraph) -> Result<Vec<Violation>, RuleFailure> {
    debug!(rule = rule.name(), code = rule.code(), "running rule");
    match rule.check(graph) {
        Ok(violations) => {
            debug!(rule = rule.name(), violations = violations.len(), "rule finished");
            Ok(violations)
        }
        Err(error) => {
            warn!(rule = rule.name(), error = %error, "rule failed");
            Err(RuleFailure {
                code: rule.code().to_string(),
                rule: rule.name().to_string(),
                error,
            })
        }
    }
}
