//! Human-readable text output formatter

use super::OutputFormatter;
use crate::engine::ScanResult;
use crate::finding::{Finding, Severity};
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show pseudocode excerpts
    pub show_excerpt: bool,

    /// Show help text
    pub show_help: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_excerpt: true,
            show_help: true,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Disable the trailing statistics block
    pub fn without_stats(mut self) -> Self {
        self.show_stats = false;
        self
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = format!("{}", severity);
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
            Severity::Info => s.blue(),
        }
    }

    fn gutter(&self) -> String {
        if self.colored {
            "|".blue().to_string()
        } else {
            "|".to_string()
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &ScanResult) -> String {
        let mut output = String::new();

        if result.is_clean() {
            output.push_str("no issues found.\n");
        }

        // Findings grouped by method, preserving scan order
        let mut current_method: Option<&str> = None;
        for finding in &result.findings {
            if current_method != Some(finding.location.method.as_str()) {
                if current_method.is_some() {
                    output.push('\n');
                }
                current_method = Some(&finding.location.method);
                if self.colored {
                    output.push_str(&format!("{}\n", finding.location.method.underline()));
                } else {
                    output.push_str(&format!("{}\n", finding.location.method));
                }
            }
            output.push_str(&self.format_finding(finding));
        }

        // Statistics
        if self.show_stats {
            output.push_str(&format!(
                "\n{} {} scanned",
                result.methods_scanned,
                if result.methods_scanned == 1 {
                    "method"
                } else {
                    "methods"
                }
            ));

            let mut counts = Vec::new();
            if result.error_count > 0 {
                let s = format!(
                    "{} {}",
                    result.error_count,
                    if result.error_count == 1 {
                        "error"
                    } else {
                        "errors"
                    }
                );
                counts.push(if self.colored {
                    s.red().to_string()
                } else {
                    s
                });
            }
            if result.warning_count > 0 {
                let s = format!(
                    "{} {}",
                    result.warning_count,
                    if result.warning_count == 1 {
                        "warning"
                    } else {
                        "warnings"
                    }
                );
                counts.push(if self.colored {
                    s.yellow().to_string()
                } else {
                    s
                });
            }
            if result.info_count > 0 {
                let s = format!(
                    "{} {}",
                    result.info_count,
                    if result.info_count == 1 { "info" } else { "infos" }
                );
                counts.push(if self.colored {
                    s.blue().to_string()
                } else {
                    s
                });
            }

            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');

            output.push_str(&format!(
                "Finished in {:.2}s\n",
                result.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let mut output = String::new();

        // Main finding line
        output.push_str(&format!(
            "  {} {}[{}]: {}\n",
            finding.location.path,
            self.severity_str(finding.severity),
            if self.colored {
                finding.rule_id.cyan().to_string()
            } else {
                finding.rule_id.clone()
            },
            finding.message
        ));

        // Pseudocode excerpt
        if self.show_excerpt {
            if let Some(excerpt) = &finding.excerpt {
                for line in excerpt.lines() {
                    let text = if self.colored {
                        line.dimmed().to_string()
                    } else {
                        line.to_string()
                    };
                    output.push_str(&format!("    {} {}\n", self.gutter(), text));
                }
            }
        }

        // Help text
        if self.show_help {
            if let Some(help) = &finding.help {
                output.push_str(&format!("    = help: {}\n", help));
            }
        }

        if finding.fixable {
            let marker = if self.colored {
                "fixable".green().to_string()
            } else {
                "fixable".to_string()
            };
            output.push_str(&format!("    = {} with `refit fix`\n", marker));
        }

        for note in &finding.notes {
            output.push_str(&format!("    = note: {}\n", note));
        }

        output
    }
}
