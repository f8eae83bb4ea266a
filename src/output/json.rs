//! JSON output formatter

use super::OutputFormatter;
use crate::engine::ScanResult;
use crate::finding::Finding;
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    findings: Vec<JsonFinding<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    rule_id: &'a str,
    severity: String,
    message: &'a str,
    method: &'a str,
    path: String,
    fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSummary {
    methods_scanned: usize,
    methods_with_findings: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    duration_ms: u128,
}

impl JsonFormatter {
    fn to_json_finding<'a>(finding: &'a Finding) -> JsonFinding<'a> {
        JsonFinding {
            rule_id: &finding.rule_id,
            severity: finding.severity.to_string(),
            message: &finding.message,
            method: &finding.location.method,
            path: finding.location.path.to_string(),
            fixable: finding.fixable,
            excerpt: finding.excerpt.as_deref(),
            help: finding.help.as_deref(),
        }
    }

    fn serialize<T: Serialize>(&self, value: &T) -> String {
        let out = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        out.unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &ScanResult) -> String {
        let output = JsonOutput {
            findings: result.findings.iter().map(Self::to_json_finding).collect(),
            summary: JsonSummary {
                methods_scanned: result.methods_scanned,
                methods_with_findings: result.methods_with_findings,
                error_count: result.error_count,
                warning_count: result.warning_count,
                info_count: result.info_count,
                duration_ms: result.duration.as_millis(),
            },
        };

        self.serialize(&output)
    }

    fn format_finding(&self, finding: &Finding) -> String {
        self.serialize(&Self::to_json_finding(finding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Location, Severity};
    use crate::syntax::NodePath;

    fn result() -> ScanResult {
        ScanResult {
            findings: vec![Finding::new(
                "magic-number",
                Severity::Info,
                "Magic number 18",
                Location::new("check_age", NodePath(vec![0, 0])),
                42,
            )
            .with_excerpt("age > 18")
            .fixable()],
            methods_scanned: 1,
            methods_with_findings: 1,
            info_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_output_round_trips_as_json() {
        let output = JsonFormatter::new().format(&result());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["findings"][0]["rule_id"], "magic-number");
        assert_eq!(parsed["findings"][0]["severity"], "info");
        assert_eq!(parsed["findings"][0]["method"], "check_age");
        assert_eq!(parsed["findings"][0]["path"], "0.0");
        assert_eq!(parsed["findings"][0]["fixable"], true);
        assert_eq!(parsed["summary"]["methods_scanned"], 1);
        assert_eq!(parsed["summary"]["info_count"], 1);
    }

    #[test]
    fn test_finding_count_matches_summary() {
        let r = result();
        let output = JsonFormatter::new().pretty().format(&r);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            parsed["findings"].as_array().unwrap().len(),
            r.findings.len()
        );
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let finding = Finding::new(
            "nested-conditional",
            Severity::Warning,
            "deep",
            Location::new("m", NodePath::root()),
            0,
        );
        let output = JsonFormatter::new().format_finding(&finding);
        assert!(!output.contains("excerpt"));
        assert!(!output.contains("help"));
    }
}
