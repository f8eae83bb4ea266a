//! Rule definition: a match predicate plus an optional structural rewrite

use crate::finding::Severity;
use crate::rewriter::RewriteError;
use crate::syntax::{Constant, Method, SyntaxNode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Control flow that is harder to follow than it needs to be
    Complexity,
    /// The same computation written more than once
    Duplication,
    /// Code whose intent is obscured (unnamed values, unclear shapes)
    Readability,
    /// Consistency and convention rules
    #[default]
    Style,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Complexity => write!(f, "complexity"),
            RuleCategory::Duplication => write!(f, "duplication"),
            RuleCategory::Readability => write!(f, "readability"),
            RuleCategory::Style => write!(f, "style"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "complexity" => Ok(RuleCategory::Complexity),
            "duplication" => Ok(RuleCategory::Duplication),
            "readability" => Ok(RuleCategory::Readability),
            "style" => Ok(RuleCategory::Style),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Static metadata describing a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMeta {
    /// Unique rule identifier (e.g., "nested-conditional")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Detailed description
    pub description: String,

    /// Default severity level
    pub severity: Severity,

    /// Rule category
    pub category: RuleCategory,

    /// Rationale explaining why this rule exists
    #[serde(default)]
    pub rationale: Option<String>,

    /// Example of code that violates this rule
    #[serde(default)]
    pub example_bad: Option<String>,

    /// Example of correct code
    #[serde(default)]
    pub example_good: Option<String>,
}

impl RuleMeta {
    /// Create metadata with the required fields
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            severity: Severity::Warning,
            category: RuleCategory::default(),
            rationale: None,
            example_bad: None,
            example_good: None,
        }
    }

    /// Set the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the rationale
    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    /// Set the bad example
    pub fn with_example_bad(mut self, example: &str) -> Self {
        self.example_bad = Some(example.to_string());
        self
    }

    /// Set the good example
    pub fn with_example_good(mut self, example: &str) -> Self {
        self.example_good = Some(example.to_string());
        self
    }
}

/// The product of a rule's rewrite
///
/// Beyond the replacement subtree, a refactor may hoist things into the
/// enclosing scope: named constants (magic-number extraction) and helper
/// query methods (repeated-subexpression extraction). The rewriter merges
/// constants into the method; extracted helpers are handed back to the
/// caller, since a `Method` has no slot for sibling methods.
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// Subtree that replaces the matched node
    pub replacement: SyntaxNode,
    /// Constants to declare in the enclosing scope
    pub new_constants: Vec<Constant>,
    /// Helper methods extracted by the refactor
    pub extracted_methods: Vec<Method>,
}

impl Rewrite {
    /// A rewrite that only replaces the matched subtree
    pub fn replacement(replacement: SyntaxNode) -> Self {
        Self {
            replacement,
            new_constants: Vec::new(),
            extracted_methods: Vec::new(),
        }
    }
}

/// A code-smell rule: pure predicate plus optional auto-fix
///
/// `matches` must be a pure function of the node; rules hold only
/// immutable configuration, so a registry of them is safe to share across
/// threads without synchronization.
pub trait Rule: Send + Sync {
    /// Static metadata
    fn meta(&self) -> &RuleMeta;

    /// Whether this rule flags the given node
    fn matches(&self, node: &SyntaxNode) -> bool;

    /// Finding message for a matched node
    fn message(&self, _node: &SyntaxNode) -> String {
        self.meta().description.clone()
    }

    /// Whether this rule has an auto-fix
    fn has_rewrite(&self) -> bool {
        false
    }

    /// When true, the scanner suppresses matches on descendants of an
    /// already-matched node, so one structural smell yields one finding.
    fn report_outermost_only(&self) -> bool {
        false
    }

    /// Produce the corrective rewrite for a matched node
    ///
    /// Invoking this on a node for which `matches` is false is a caller
    /// error and fails with `InvalidRewriteTarget`.
    fn rewrite(&self, _node: &SyntaxNode) -> Result<Rewrite, RewriteError> {
        Err(RewriteError::UnsupportedRewrite {
            rule: self.meta().id.clone(),
        })
    }

    /// Shorthand for the rule id
    fn id(&self) -> &str {
        &self.meta().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverRule {
        meta: RuleMeta,
    }

    impl Rule for NeverRule {
        fn meta(&self) -> &RuleMeta {
            &self.meta
        }

        fn matches(&self, _node: &SyntaxNode) -> bool {
            false
        }
    }

    #[test]
    fn test_meta_builder() {
        let meta = RuleMeta::new("test-rule", "Test rule", "A test rule")
            .with_severity(Severity::Error)
            .with_category(RuleCategory::Complexity)
            .with_rationale("because")
            .with_example_bad("if (a) { if (b) { } }")
            .with_example_good("if (!a) return;");

        assert_eq!(meta.id, "test-rule");
        assert_eq!(meta.severity, Severity::Error);
        assert_eq!(meta.category, RuleCategory::Complexity);
        assert!(meta.example_bad.is_some());
        assert!(meta.example_good.is_some());
    }

    #[test]
    fn test_category_round_trip() {
        for cat in [
            RuleCategory::Complexity,
            RuleCategory::Duplication,
            RuleCategory::Readability,
            RuleCategory::Style,
        ] {
            let parsed: RuleCategory = cat.to_string().parse().unwrap();
            assert_eq!(parsed, cat);
        }
        assert!("nonsense".parse::<RuleCategory>().is_err());
    }

    #[test]
    fn test_default_rewrite_is_unsupported() {
        let rule = NeverRule {
            meta: RuleMeta::new("never", "Never", "never matches"),
        };
        assert!(!rule.has_rewrite());
        let err = rule.rewrite(&SyntaxNode::ident("x")).unwrap_err();
        assert!(matches!(err, RewriteError::UnsupportedRewrite { .. }));
    }
}
