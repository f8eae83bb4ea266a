//! Nested conditional chains and the guard-clause rewrite

use crate::finding::Severity;
use crate::rewriter::RewriteError;
use crate::rule::{Rewrite, Rule, RuleCategory, RuleMeta};
use crate::syntax::SyntaxNode;

/// Flags if-chains nested past a depth threshold and flattens them into
/// sequential guard clauses.
///
/// A chain level is an `if` whose then-block's sole or trailing statement
/// is the next `if`. Levels that already early-return are not chains and
/// are left alone.
pub struct NestedConditionalRule {
    meta: RuleMeta,
    min_depth: usize,
}

impl NestedConditionalRule {
    pub fn new(min_depth: usize) -> Self {
        let meta = RuleMeta::new(
            "nested-conditional",
            "Nested conditional",
            "Deeply nested conditionals obscure the happy path",
        )
        .with_severity(Severity::Warning)
        .with_category(RuleCategory::Complexity)
        .with_rationale(
            "Each nesting level forces the reader to keep one more precondition \
             in mind. Guard clauses state the preconditions up front and leave \
             the success logic at the top level.",
        )
        .with_example_bad(
            "if (order != null) {\n    if (!order.cancelled) {\n        if (has_stock(order)) {\n            complete(order);\n        }\n    }\n}",
        )
        .with_example_good(
            "if (order == null) {\n    return;\n}\nif (order.cancelled) {\n    return;\n}\nif (!has_stock(order)) {\n    return;\n}\ncomplete(order);",
        );

        Self { meta, min_depth }
    }

    /// Number of chained levels starting at `node`
    ///
    /// Zero for anything that is not an if; a level only extends the chain
    /// through the trailing statement of its then-block, and only if no
    /// earlier statement in that block already returns.
    fn chain_depth(node: &SyntaxNode) -> usize {
        let SyntaxNode::If { then_branch, .. } = node else {
            return 0;
        };
        let SyntaxNode::Block { statements } = then_branch.as_ref() else {
            return 1;
        };
        let Some((last, leading)) = statements.split_last() else {
            return 1;
        };
        if leading
            .iter()
            .any(|s| matches!(s, SyntaxNode::Return { .. }))
        {
            return 1;
        }
        match last {
            SyntaxNode::If { .. } => 1 + Self::chain_depth(last),
            _ => 1,
        }
    }

    /// Flatten a matched chain into guards followed by the success logic
    fn flatten(node: &SyntaxNode) -> Vec<SyntaxNode> {
        let mut out = Vec::new();
        let mut current = node;

        loop {
            let SyntaxNode::If {
                condition,
                then_branch,
                else_branch,
            } = current
            else {
                break;
            };

            // The guard inherits the level's else-statements as its body,
            // then returns early.
            let mut guard_body = Vec::new();
            if let Some(e) = else_branch {
                if let SyntaxNode::Block { statements } = e.as_ref() {
                    guard_body.extend(statements.iter().cloned());
                }
            }
            guard_body.push(SyntaxNode::ret(None));
            out.push(SyntaxNode::if_then(
                condition.negated(),
                SyntaxNode::block(guard_body),
            ));

            let SyntaxNode::Block { statements } = then_branch.as_ref() else {
                break;
            };
            match statements.split_last() {
                Some((last @ SyntaxNode::If { .. }, leading)) => {
                    // Statements before the nested if keep their order,
                    // now guarded by the emitted clause.
                    out.extend(leading.iter().cloned());
                    current = last;
                }
                _ => {
                    // Innermost level: the success logic moves to the top.
                    out.extend(statements.iter().cloned());
                    break;
                }
            }
        }

        out
    }
}

impl Rule for NestedConditionalRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn matches(&self, node: &SyntaxNode) -> bool {
        Self::chain_depth(node) >= self.min_depth
    }

    fn message(&self, node: &SyntaxNode) -> String {
        format!(
            "Conditional nested {} levels deep; flatten with guard clauses",
            Self::chain_depth(node)
        )
    }

    fn has_rewrite(&self) -> bool {
        true
    }

    fn report_outermost_only(&self) -> bool {
        true
    }

    fn rewrite(&self, node: &SyntaxNode) -> Result<Rewrite, RewriteError> {
        if !self.matches(node) {
            return Err(RewriteError::InvalidRewriteTarget {
                rule: self.meta.id.clone(),
            });
        }
        Ok(Rewrite::replacement(SyntaxNode::block(Self::flatten(node))))
    }
}
