//! Rule trait for graph-wide conformance rules.

use crate::graph::DependencyGraph;
use crate::pattern::PatternError;
use crate::types::{Severity, Suggestion, Violation};

/// A conformance rule evaluated over a whole [`DependencyGraph`].
///
/// Rules are pure: the same graph and configuration always give the same
/// violations in the same order. They only read the graph, so several rules
/// may run concurrently over one graph.
///
/// # Example
///
/// ```ignore
/// use arch_conform_core::{DependencyGraph, GraphRule, PatternError, Severity, Violation};
///
/// pub struct NoIsolatedUnits;
///
/// impl GraphRule for NoIsolatedUnits {
///     fn name(&self) -> &str { "no-isolated-units" }
///     fn code(&self) -> &'static str { "AC100" }
///     fn severity(&self) -> Severity { Severity::Info }
///
///     fn check(&self, graph: &DependencyGraph) -> Result<Vec<Violation>, PatternError> {
///         Ok(graph
///             .node_ids()
///             .filter(|&id| graph.incoming(id).is_empty() && graph.outgoing(id).is_empty())
///             .map(|id| Violation::new(self.code(), self.name(), self.severity(), graph.name(id), "isolated unit"))
///             .collect())
///     }
/// }
/// ```
pub trait GraphRule: Send + Sync {
    /// Returns the instance name of this rule (e.g., "controllers-isolated").
    fn name(&self) -> &str;

    /// Returns the rule code (e.g., "AC001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the severity attached to violations of this rule.
    fn severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks the graph and returns every violation found.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if a pattern in the rule's configuration is
    /// malformed. Only this rule is affected.
    fn check(&self, graph: &DependencyGraph) -> Result<Vec<Violation>, PatternError>;
}

/// Type alias for boxed [`GraphRule`] trait objects.
pub type RuleBox = Box<dyn GraphRule>;

/// Presentation metadata shared by the built-in rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMeta {
    name: String,
    severity: Severity,
    rationale: Option<String>,
    doc_ref: Option<String>,
}

impl RuleMeta {
    /// Creates metadata with error severity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity: Severity::Error,
            rationale: None,
            doc_ref: None,
        }
    }

    /// Replaces the instance name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the rationale shown as help on every violation.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// Sets the design document reference.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }

    /// Returns the instance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Starts a violation carrying this rule's code, name and severity.
    #[must_use]
    pub fn violation(
        &self,
        code: &str,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Violation {
        Violation::new(code, self.name.as_str(), self.severity, subject, message)
    }

    /// Attaches rationale and doc reference to a finished violation.
    #[must_use]
    pub fn decorate(&self, mut violation: Violation) -> Violation {
        if let Some(rationale) = &self.rationale {
            violation = violation.with_suggestion(Suggestion::new(rationale.as_str()));
        }
        if let Some(doc) = &self.doc_ref {
            violation = violation.with_doc_ref(doc.as_str());
        }
        violation
    }
}
