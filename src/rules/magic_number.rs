//! Bare numeric literals and the named-constant rewrite

use crate::finding::Severity;
use crate::rewriter::RewriteError;
use crate::rule::{Rewrite, Rule, RuleCategory, RuleMeta};
use crate::syntax::{Constant, LiteralValue, SyntaxNode};

/// Flags numeric literals used directly inside comparisons or arithmetic
/// and extracts them into named constants at the enclosing scope.
///
/// 0, 1 and -1 (and their decimal forms) are idiomatic and exempt by
/// default; the exemption list is configurable. String literals are out
/// of scope.
pub struct MagicNumberRule {
    meta: RuleMeta,
    allowed: Vec<i64>,
}

impl MagicNumberRule {
    pub fn new(allowed: Vec<i64>) -> Self {
        let meta = RuleMeta::new(
            "magic-number",
            "Magic number",
            "Unnamed numeric literal in an expression",
        )
        .with_severity(Severity::Info)
        .with_category(RuleCategory::Readability)
        .with_rationale(
            "A bare number says what the code compares against but not why. \
             A named constant records the intent and gives repeated uses a \
             single point of change.",
        )
        .with_example_bad("if (age > 18) {\n    discount = 0.1;\n}")
        .with_example_good("const ADULT_AGE = 18;\n\nif (age > ADULT_AGE) {\n    ...\n}")
        ;

        Self { meta, allowed }
    }

    fn is_magic(&self, value: &LiteralValue) -> bool {
        match value {
            LiteralValue::Int(n) => !self.allowed.contains(n),
            LiteralValue::Decimal(s) => match s.parse::<f64>() {
                Ok(v) => !self.allowed.iter().any(|&a| v == a as f64),
                Err(_) => false,
            },
            _ => false,
        }
    }

    /// Direct literal children of an expression node that are magic
    fn magic_children(&self, node: &SyntaxNode) -> Vec<LiteralValue> {
        let SyntaxNode::BinaryExpr { op, left, right } = node else {
            return Vec::new();
        };
        if !op.is_comparison() && !op.is_arithmetic() {
            return Vec::new();
        }
        [left.as_ref(), right.as_ref()]
            .into_iter()
            .filter_map(|child| match child {
                SyntaxNode::Literal { value } if self.is_magic(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Deterministic constant name derived from the literal value
    ///
    /// Value-derived naming is what unifies repeated occurrences of the
    /// same literal under one constant: every rewrite of the same value
    /// produces the same name, and the rewriter deduplicates on merge.
    pub fn constant_name(value: &LiteralValue) -> String {
        let text = value.to_string().replace('-', "NEG_").replace('.', "_");
        format!("CONST_{}", text)
    }
}

impl Rule for MagicNumberRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn matches(&self, node: &SyntaxNode) -> bool {
        !self.magic_children(node).is_empty()
    }

    fn message(&self, node: &SyntaxNode) -> String {
        let values: Vec<String> = self
            .magic_children(node)
            .iter()
            .map(|v| v.to_string())
            .collect();
        format!(
            "Magic number {} in expression; extract a named constant",
            values.join(", ")
        )
    }

    fn has_rewrite(&self) -> bool {
        true
    }

    fn rewrite(&self, node: &SyntaxNode) -> Result<Rewrite, RewriteError> {
        if !self.matches(node) {
            return Err(RewriteError::InvalidRewriteTarget {
                rule: self.meta.id.clone(),
            });
        }
        let SyntaxNode::BinaryExpr { op, left, right } = node else {
            unreachable!("matches() admits only binary expressions");
        };

        let mut constants = Vec::new();
        let mut replace = |child: &SyntaxNode| -> SyntaxNode {
            match child {
                SyntaxNode::Literal { value } if self.is_magic(value) => {
                    let name = Self::constant_name(value);
                    if !constants
                        .iter()
                        .any(|c: &Constant| c.name == name)
                    {
                        constants.push(Constant::new(&name, value.clone()));
                    }
                    SyntaxNode::ident(&name)
                }
                other => other.clone(),
            }
        };

        let replacement = SyntaxNode::BinaryExpr {
            op: *op,
            left: Box::new(replace(left)),
            right: Box::new(replace(right)),
        };

        Ok(Rewrite {
            replacement,
            new_constants: constants,
            extracted_methods: Vec::new(),
        })
    }
}
