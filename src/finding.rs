//! Finding types for scan results

use crate::syntax::NodePath;
use serde::{Deserialize, Serialize};

/// Severity level for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning - potential issue
    #[default]
    Warning,
    /// Error - definite problem
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Where a finding points: a method name plus a path into its body tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Name of the method containing the node
    pub method: String,
    /// Child-index path from the body root
    pub path: NodePath,
}

impl Location {
    pub fn new(method: &str, path: NodePath) -> Self {
        Self {
            method: method.to_string(),
            path,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.method, self.path)
    }
}

/// A single detected rule violation at a specific syntax location
///
/// Findings address their node by path plus a structural fingerprint of
/// the subtree taken at scan time. A rewrite invalidates both, which is
/// what lets the rewriter refuse stale findings instead of silently
/// splicing into the wrong tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule ID that produced this finding
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Location of the offending node
    pub location: Location,
    /// Fingerprint of the offending subtree at scan time
    pub fingerprint: u64,
    /// Pseudocode excerpt of the offending node (for display)
    pub excerpt: Option<String>,
    /// Help text (usually the rule description)
    pub help: Option<String>,
    /// Whether the producing rule supports auto-fix
    pub fixable: bool,
    /// Additional notes
    pub notes: Vec<String>,
}

impl Finding {
    /// Create a new finding
    pub fn new(
        rule_id: &str,
        severity: Severity,
        message: &str,
        location: Location,
        fingerprint: u64,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.to_string(),
            location,
            fingerprint,
            excerpt: None,
            help: None,
            fixable: false,
            notes: Vec::new(),
        }
    }

    /// Attach a pseudocode excerpt
    pub fn with_excerpt(mut self, excerpt: &str) -> Self {
        self.excerpt = Some(excerpt.to_string());
        self
    }

    /// Attach help text
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Mark the finding as auto-fixable
    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
