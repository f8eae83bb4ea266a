//! Output formatters for scan results

mod compact;
mod json;
mod text;

pub use compact::CompactFormatter;
pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::config::OutputFormat;
use crate::engine::ScanResult;
use crate::finding::Finding;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the entire scan result
    fn format(&self, result: &ScanResult) -> String;

    /// Format a single finding
    fn format_finding(&self, finding: &Finding) -> String;
}

/// Build the formatter for a configured output format
pub fn formatter_for(format: OutputFormat, colored: bool, statistics: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => {
            let mut f = TextFormatter::new();
            if !colored {
                f = f.without_color();
            }
            if !statistics {
                f = f.without_stats();
            }
            Box::new(f)
        }
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Compact => Box::new(CompactFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_for_honors_statistics_setting() {
        let result = ScanResult {
            methods_scanned: 2,
            ..Default::default()
        };

        let with_stats = formatter_for(OutputFormat::Text, false, true).format(&result);
        assert!(with_stats.contains("2 methods scanned"));

        let without_stats = formatter_for(OutputFormat::Text, false, false).format(&result);
        assert!(!without_stats.contains("scanned"));
        assert!(without_stats.contains("no issues found."));
    }
}
