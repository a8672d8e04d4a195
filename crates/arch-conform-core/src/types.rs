//! Core types for conformance violations and check results.

use serde::{Deserialize, Serialize, Serializer};

use crate::pattern::PatternError;

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail a check.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A concrete node-level dependency backing a violation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Witness {
    /// Fully-qualified name of the depending unit.
    pub origin: String,
    /// Fully-qualified name of the unit depended upon.
    pub target: String,
}

impl Witness {
    /// Creates a new witness.
    #[must_use]
    pub fn new(origin: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
        }
    }
}

impl std::fmt::Display for Witness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.origin, self.target)
    }
}

/// A suggested way to resolve a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description of the fix.
    pub message: String,
}

impl Suggestion {
    /// Creates a new suggestion.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A conformance violation found during a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g., "AC001").
    pub code: String,
    /// Rule instance name (e.g., "controllers-may-not-be-accessed").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// The offending unit or slice.
    pub subject: String,
    /// Units or slices implicated besides the subject.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implicated: Vec<String>,
    /// Human-readable message.
    pub message: String,
    /// Concrete dependencies that make up the violation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub witnesses: Vec<Witness>,
    /// Optional suggestion or rationale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
    /// Reference to design document (e.g., "ARCHITECTURE.md L85").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ref: Option<String>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            subject: subject.into(),
            implicated: Vec::new(),
            message: message.into(),
            witnesses: Vec::new(),
            suggestion: None,
            doc_ref: None,
        }
    }

    /// Adds an implicated unit or slice.
    #[must_use]
    pub fn with_implicated(mut self, name: impl Into<String>) -> Self {
        self.implicated.push(name.into());
        self
    }

    /// Adds a witnessing dependency.
    #[must_use]
    pub fn with_witness(mut self, witness: Witness) -> Self {
        self.witnesses.push(witness);
        self
    }

    /// Adds several witnessing dependencies.
    #[must_use]
    pub fn with_witnesses(mut self, witnesses: impl IntoIterator<Item = Witness>) -> Self {
        self.witnesses.extend(witnesses);
        self
    }

    /// Adds a suggestion to this violation.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Adds a design document reference to this violation.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = String::new();
        let _ = writeln!(output, "{} {} on {}", self.code, self.rule, self.subject);
        self.write_details(&mut output);
        output
    }

    /// Writes the indented message, witness, help and doc lines.
    fn write_details(&self, out: &mut String) {
        use std::fmt::Write;
        let _ = writeln!(out, "  {}: {}", self.severity, self.message);
        for witness in &self.witnesses {
            let _ = writeln!(out, "  | {witness}");
        }
        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(out, "  = help: {}", suggestion.message);
        }
        if let Some(doc_ref) = &self.doc_ref {
            let _ = writeln!(out, "  = see: {doc_ref}");
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.subject, self.severity, self.code, self.message
        )?;
        if let Some(doc_ref) = &self.doc_ref {
            write!(f, " (see: {doc_ref})")?;
        }
        Ok(())
    }
}

/// A rule that could not be evaluated.
///
/// Kept apart from violations: a failure means the rule's configuration is
/// broken, not that the architecture is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    /// Rule code.
    pub code: String,
    /// Rule instance name.
    pub rule: String,
    /// Why the rule aborted.
    #[serde(serialize_with = "serialize_display")]
    pub error: PatternError,
}

impl std::fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.rule, self.code, self.error)
    }
}

fn serialize_display<S: Serializer, T: std::fmt::Display>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Result of running a set of rules over one graph.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    /// All violations found, in rule order.
    pub violations: Vec<Violation>,
    /// Rules that aborted with a fatal error.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RuleFailure>,
    /// Number of rules evaluated.
    pub rules_checked: usize,
    /// Number of nodes in the checked graph.
    pub nodes_checked: usize,
}

impl CheckResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any error-level violations.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == Severity::Error)
    }

    /// Returns true if there are any warnings or errors.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity >= Severity::Warning)
    }

    /// Returns true if any rule failed to evaluate.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns violations filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Counts violations by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |s: Severity| self.violations.iter().filter(|v| v.severity == s).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Returns true if nothing at or above `fail_on` was found and every rule
    /// could be evaluated.
    #[must_use]
    pub fn passes(&self, fail_on: Severity) -> bool {
        !self.has_violations_at(fail_on) && !self.has_failures()
    }

    /// Formats violations and failures as a test failure report.
    ///
    /// Produces a human-readable multi-line report suitable for `panic!()`
    /// messages in `cargo test` integration.
    #[must_use]
    pub fn format_test_report(&self, fail_on: Severity) -> String {
        use std::fmt::Write;

        let failing: Vec<&Violation> = self
            .violations
            .iter()
            .filter(|v| v.severity >= fail_on)
            .collect();

        let mut report = String::new();
        let _ = writeln!(
            report,
            "\n=== arch-conform: {} violation(s) ===\n",
            failing.len()
        );

        for v in &failing {
            let _ = writeln!(report, "{} [{}] on {}", v.rule, v.code, v.subject);
            v.write_details(&mut report);
            let _ = writeln!(report);
        }

        if !self.failures.is_empty() {
            let _ = writeln!(report, "--- {} rule failure(s) ---", self.failures.len());
            for failure in &self.failures {
                let _ = writeln!(report, "{failure}");
            }
            let _ = writeln!(report);
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = writeln!(
            report,
            "Total: {} error(s), {} warning(s), {} info(s) from {} rule(s) over {} unit(s)",
            errors, warnings, infos, self.rules_checked, self.nodes_checked
        );

        report
    }

    /// Adds violations and failures from another result.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
        self.failures.extend(other.failures);
        self.rules_checked += other.rules_checked;
        self.nodes_checked = self.nodes_checked.max(other.nodes_checked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            "AC001",
            "controllers-isolated",
            severity,
            "com.example.controllers.Ctrl",
            "Layer 'controllers' may not be accessed by any layer",
        )
        .with_witness(Witness::new(
            "com.example.service.Service",
            "com.example.controllers.Ctrl",
        ))
    }

    #[test]
    fn violation_new_has_no_doc_ref() {
        let v = make_violation(Severity::Error);
        assert!(v.doc_ref.is_none());
        assert!(v.implicated.is_empty());
    }

    #[test]
    fn violation_format_lists_witnesses() {
        let formatted = make_violation(Severity::Error).format();
        assert!(formatted.starts_with("AC001 controllers-isolated on com.example.controllers.Ctrl\n"));
        assert!(formatted
            .contains("  | com.example.service.Service -> com.example.controllers.Ctrl\n"));
        assert!(!formatted.contains("see:"));
    }

    #[test]
    fn violation_format_includes_doc_ref_and_help() {
        let v = make_violation(Severity::Error)
            .with_doc_ref("ARCHITECTURE.md L85")
            .with_suggestion(Suggestion::new("Go through a service"));
        let formatted = v.format();
        assert!(formatted.contains("= see: ARCHITECTURE.md L85"));
        assert!(formatted.contains("= help: Go through a service"));
    }

    #[test]
    fn violation_display_is_one_line() {
        let v = make_violation(Severity::Warning).with_doc_ref("DDD.md L33");
        let display = format!("{v}");
        assert_eq!(
            display,
            "com.example.controllers.Ctrl: warning [AC001] Layer 'controllers' may not be accessed by any layer (see: DDD.md L33)"
        );
    }

    #[test]
    fn has_violations_at_error_only() {
        let mut result = CheckResult::new();
        result.violations.push(make_violation(Severity::Warning));
        assert!(!result.has_violations_at(Severity::Error));
        assert!(result.has_violations_at(Severity::Warning));
        assert!(result.passes(Severity::Error));
        assert!(!result.passes(Severity::Warning));
    }

    #[test]
    fn failures_prevent_passing() {
        let mut result = CheckResult::new();
        result.failures.push(RuleFailure {
            code: "AC003".to_string(),
            rule: "cycles".to_string(),
            error: PatternError::Empty,
        });
        assert!(!result.passes(Severity::Error));
        assert!(!result.has_errors());
    }

    #[test]
    fn format_test_report_filters_by_severity() {
        let mut result = CheckResult::new();
        result.rules_checked = 2;
        result.nodes_checked = 5;
        result.violations.push(make_violation(Severity::Warning));
        result.violations.push(make_violation(Severity::Error));

        let report = result.format_test_report(Severity::Error);
        assert!(report.contains("1 violation(s)"));
        assert!(report.contains("1 error(s)"));
        assert!(report.contains("1 warning(s)"));
        assert!(report.contains("from 2 rule(s) over 5 unit(s)"));
    }

    #[test]
    fn test_report_and_format_share_detail_lines() {
        let violation = make_violation(Severity::Error)
            .with_witness(Witness::new("a.X", "b.Y"))
            .with_doc_ref("ARCH.md#layers");
        let formatted = violation.format();
        let (_, details) = formatted.split_once('\n').unwrap();

        let mut result = CheckResult::new();
        result.violations.push(violation);
        let report = result.format_test_report(Severity::Error);
        assert!(report.contains(details));
        assert!(details.contains("  | a.X -> b.Y"));
        assert!(details.contains("  = see: ARCH.md#layers"));
    }

    #[test]
    fn format_test_report_lists_failures() {
        let mut result = CheckResult::new();
        result.failures.push(RuleFailure {
            code: "AC003".to_string(),
            rule: "cycles".to_string(),
            error: PatternError::Empty,
        });
        let report = result.format_test_report(Severity::Error);
        assert!(report.contains("--- 1 rule failure(s) ---"));
        assert!(report.contains("cycles [AC003]: package pattern must not be empty"));
    }

    #[test]
    fn failures_serialize_as_text() {
        let failure = RuleFailure {
            code: "AC002".to_string(),
            rule: "self".to_string(),
            error: PatternError::Empty,
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["error"], "package pattern must not be empty");
    }

    #[test]
    fn extend_merges_counts() {
        let mut a = CheckResult::new();
        a.rules_checked = 1;
        a.nodes_checked = 3;
        let mut b = CheckResult::new();
        b.rules_checked = 2;
        b.nodes_checked = 3;
        b.violations.push(make_violation(Severity::Error));
        a.extend(b);
        assert_eq!(a.rules_checked, 3);
        assert_eq!(a.nodes_checked, 3);
        assert_eq!(a.violations.len(), 1);
    }
}
