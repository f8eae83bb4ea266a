//! Compact output formatter
//!
//! One line per finding, minimal output for scripting.

use super::OutputFormatter;
use crate::engine::ScanResult;
use crate::finding::Finding;

/// Compact one-line-per-finding formatter
pub struct CompactFormatter {
    /// Show severity prefix
    pub show_severity: bool,
    /// Show rule ID
    pub show_rule: bool,
}

impl CompactFormatter {
    /// Create a new compact formatter
    pub fn new() -> Self {
        Self {
            show_severity: true,
            show_rule: true,
        }
    }

    /// Hide severity prefix
    pub fn without_severity(mut self) -> Self {
        self.show_severity = false;
        self
    }

    /// Hide rule ID
    pub fn without_rule(mut self) -> Self {
        self.show_rule = false;
        self
    }
}

impl Default for CompactFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for CompactFormatter {
    fn format(&self, result: &ScanResult) -> String {
        let mut output = String::new();

        for finding in &result.findings {
            output.push_str(&self.format_finding(finding));
            output.push('\n');
        }

        output
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let mut parts = Vec::new();

        // method:path
        parts.push(format!(
            "{}:{}",
            finding.location.method, finding.location.path
        ));

        if self.show_severity {
            parts.push(finding.severity.to_string());
        }

        if self.show_rule {
            parts.push(finding.rule_id.clone());
        }

        parts.push(finding.message.clone());

        parts.join(": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Location, Severity};
    use crate::syntax::NodePath;

    fn finding() -> Finding {
        Finding::new(
            "compound-condition",
            Severity::Warning,
            "Condition combines 3 checks; decompose into guard clauses",
            Location::new("apply_discount", NodePath(vec![1])),
            7,
        )
    }

    #[test]
    fn test_one_line_per_finding() {
        let formatter = CompactFormatter::new();
        let line = formatter.format_finding(&finding());
        assert_eq!(
            line,
            "apply_discount:1: warning: compound-condition: Condition combines 3 checks; decompose into guard clauses"
        );
    }

    #[test]
    fn test_suppressed_fields() {
        let formatter = CompactFormatter::new().without_severity().without_rule();
        let line = formatter.format_finding(&finding());
        assert!(!line.contains("warning"));
        assert!(!line.contains("compound-condition"));
        assert!(line.starts_with("apply_discount:1: "));
    }

    #[test]
    fn test_format_appends_newlines() {
        let result = ScanResult {
            findings: vec![finding(), finding()],
            ..Default::default()
        };
        let output = CompactFormatter::new().format(&result);
        assert_eq!(output.lines().count(), 2);
    }
}
