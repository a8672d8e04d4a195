//! Output formatting for check results.

use anyhow::Result;
use arch_conform_core::{CheckResult, Severity};
use std::fmt::Write;

use crate::OutputFormat;

/// Prints check results in the specified format.
pub fn print(result: &CheckResult, format: OutputFormat, fail_on: Severity) -> Result<()> {
    print!("{}", render(result, format, fail_on)?);
    Ok(())
}

fn render(result: &CheckResult, format: OutputFormat, fail_on: Severity) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result, fail_on)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)? + "\n"),
        OutputFormat::Compact => Ok(render_compact(result)),
    }
}

fn render_text(result: &CheckResult, fail_on: Severity) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let mut out = String::new();

    for violation in &result.violations {
        let _ = writeln!(out, "{}", violation.format());
    }

    for failure in &result.failures {
        let _ = writeln!(out, "\x1b[31mrule failed\x1b[0m {failure}\n");
    }

    let summary_color = if !result.passes(fail_on) {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let _ = writeln!(
        out,
        "{}Found {} error(s), {} warning(s), {} info(s) from {} rule(s) over {} unit(s)\x1b[0m",
        summary_color, errors, warnings, infos, result.rules_checked, result.nodes_checked
    );
    out
}

fn render_compact(result: &CheckResult) -> String {
    let mut out = String::new();
    for violation in &result.violations {
        let _ = writeln!(out, "{violation}");
    }
    for failure in &result.failures {
        let _ = writeln!(out, "failure: {failure}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_conform_core::{Violation, Witness};

    fn result() -> CheckResult {
        let mut result = CheckResult::new();
        result.rules_checked = 1;
        result.nodes_checked = 2;
        result.violations.push(
            Violation::new(
                "AC001",
                "web-isolated",
                Severity::Warning,
                "app.web.Ctrl",
                "Layer 'web' may not be accessed by any layer, but app.core.S depends on app.web.Ctrl",
            )
            .with_witness(Witness::new("app.core.S", "app.web.Ctrl")),
        );
        result
    }

    #[test]
    fn compact_is_one_line_per_violation() {
        let out = render(&result(), OutputFormat::Compact, Severity::Error).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("app.web.Ctrl: warning [AC001] Layer 'web'"));
    }

    #[test]
    fn text_lists_witnesses_and_summary() {
        let out = render(&result(), OutputFormat::Text, Severity::Error).unwrap();
        assert!(out.contains("AC001 web-isolated on app.web.Ctrl"));
        assert!(out.contains("  | app.core.S -> app.web.Ctrl"));
        assert!(out.contains("Found 0 error(s), 1 warning(s), 0 info(s) from 1 rule(s) over 2 unit(s)"));
    }

    #[test]
    fn json_is_parseable() {
        let out = render(&result(), OutputFormat::Json, Severity::Error).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["violations"][0]["code"], "AC001");
        assert_eq!(value["nodes_checked"], 2);
    }
}
