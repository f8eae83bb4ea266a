//! Compound boolean conditions and the decompose-conditional rewrite

use crate::finding::Severity;
use crate::rewriter::RewriteError;
use crate::rule::{Rewrite, Rule, RuleCategory, RuleMeta};
use crate::syntax::{BinaryOp, SyntaxNode};

/// Flags ifs whose condition is an AND-chain of too many conjuncts and
/// decomposes them into one guard clause per conjunct.
pub struct CompoundConditionRule {
    meta: RuleMeta,
    min_conjuncts: usize,
}

impl CompoundConditionRule {
    pub fn new(min_conjuncts: usize) -> Self {
        let meta = RuleMeta::new(
            "compound-condition",
            "Compound condition",
            "Long AND-chains hide which precondition failed",
        )
        .with_severity(Severity::Warning)
        .with_category(RuleCategory::Complexity)
        .with_rationale(
            "A condition of many conjuncts reads as one opaque test. Checking \
             each precondition in its own guard names the failure path and \
             keeps the computation at the end readable.",
        )
        .with_example_bad(
            "if (customer.vip && total > 1000 && promo_active) {\n    discount = total * 0.15;\n}",
        )
        .with_example_good(
            "if (!customer.vip) {\n    return;\n}\nif (total <= 1000) {\n    return;\n}\nif (!promo_active) {\n    return;\n}\ndiscount = total * 0.15;",
        );

        Self {
            meta,
            min_conjuncts,
        }
    }

    /// Flatten an AND-chain into its conjuncts, left to right
    fn conjuncts(expr: &SyntaxNode) -> Vec<&SyntaxNode> {
        match expr {
            SyntaxNode::BinaryExpr {
                op: BinaryOp::And,
                left,
                right,
            } => {
                let mut out = Self::conjuncts(left);
                out.extend(Self::conjuncts(right));
                out
            }
            other => vec![other],
        }
    }

    fn conjunct_count(node: &SyntaxNode) -> usize {
        match node {
            SyntaxNode::If { condition, .. } => Self::conjuncts(condition).len(),
            _ => 0,
        }
    }
}

impl Rule for CompoundConditionRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn matches(&self, node: &SyntaxNode) -> bool {
        Self::conjunct_count(node) >= self.min_conjuncts
    }

    fn message(&self, node: &SyntaxNode) -> String {
        format!(
            "Condition combines {} checks; decompose into guard clauses",
            Self::conjunct_count(node)
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
        let SyntaxNode::If {
            condition,
            then_branch,
            else_branch,
        } = node
        else {
            unreachable!("matches() admits only if nodes");
        };

        // A guard fails the way the original else did: the else statements
        // move into every guard body, followed by an early return unless
        // the else already ends in one.
        let mut failure_body = Vec::new();
        if let Some(SyntaxNode::Block { statements }) = else_branch.as_deref() {
            failure_body.extend(statements.iter().cloned());
        }
        if !matches!(failure_body.last(), Some(SyntaxNode::Return { .. })) {
            failure_body.push(SyntaxNode::ret(None));
        }

        let mut out = Vec::new();
        for conjunct in Self::conjuncts(condition) {
            out.push(SyntaxNode::if_then(
                conjunct.negated(),
                SyntaxNode::block(failure_body.clone()),
            ));
        }
        if let SyntaxNode::Block { statements } = then_branch.as_ref() {
            out.extend(statements.iter().cloned());
        }

        Ok(Rewrite::replacement(SyntaxNode::block(out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn and_chain(names: &[&str]) -> SyntaxNode {
        let mut iter = names.iter();
        let mut expr = SyntaxNode::ident(iter.next().unwrap());
        for name in iter {
            expr = SyntaxNode::binary(BinaryOp::And, expr, SyntaxNode::ident(name));
        }
        expr
    }

    #[test]
    fn test_boundary_at_three_conjuncts() {
        let rule = CompoundConditionRule::new(3);

        let two = SyntaxNode::if_then(
            and_chain(&["x", "y"]),
            SyntaxNode::block(vec![SyntaxNode::ret(None)]),
        );
        assert!(!rule.matches(&two));

        let three = SyntaxNode::if_then(
            and_chain(&["x", "y", "z"]),
            SyntaxNode::block(vec![SyntaxNode::ret(None)]),
        );
        assert!(rule.matches(&three));
    }

    #[test]
    fn test_only_and_chains_count() {
        let rule = CompoundConditionRule::new(3);
        // x || y || z is not an AND-chain
        let or = SyntaxNode::binary(
            BinaryOp::Or,
            SyntaxNode::binary(BinaryOp::Or, SyntaxNode::ident("x"), SyntaxNode::ident("y")),
            SyntaxNode::ident("z"),
        );
        let node = SyntaxNode::if_then(or, SyntaxNode::block(vec![]));
        assert!(!rule.matches(&node));
    }

    #[test]
    fn test_rewrite_emits_one_guard_per_conjunct() {
        let rule = CompoundConditionRule::new(3);
        let node = SyntaxNode::if_then(
            and_chain(&["x", "y", "z"]),
            SyntaxNode::block(vec![SyntaxNode::assign("ok", SyntaxNode::boolean(true))]),
        );

        let rewrite = rule.rewrite(&node).unwrap();
        let SyntaxNode::Block { statements } = &rewrite.replacement else {
            panic!("expected block");
        };
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[0].to_source(), "if (!x) {\n    return;\n}\n");
        assert_eq!(statements[1].to_source(), "if (!y) {\n    return;\n}\n");
        assert_eq!(statements[2].to_source(), "if (!z) {\n    return;\n}\n");
        assert_eq!(statements[3].to_source(), "ok = true;\n");

        // Fix-point: each guard has a single-conjunct condition
        for stmt in statements {
            assert!(!rule.matches(stmt));
        }
    }

    #[test]
    fn test_rewrite_reuses_else_return_value() {
        let rule = CompoundConditionRule::new(3);
        let node = SyntaxNode::if_else(
            and_chain(&["vip", "eligible", "active"]),
            SyntaxNode::block(vec![SyntaxNode::ret(Some(SyntaxNode::decimal("0.15")))]),
            SyntaxNode::block(vec![SyntaxNode::ret(Some(SyntaxNode::int(0)))]),
        );

        let rewrite = rule.rewrite(&node).unwrap();
        let src = rewrite.replacement.to_source();
        assert!(src.contains("if (!vip) {\n    return 0;\n}"));
        assert!(src.contains("return 0.15;"));
    }

    #[test]
    fn test_rewrite_carries_else_statements_into_guards() {
        let rule = CompoundConditionRule::new(3);
        let node = SyntaxNode::if_else(
            and_chain(&["paid", "in_stock", "address_valid"]),
            SyntaxNode::block(vec![SyntaxNode::call("ship", vec![])]),
            SyntaxNode::block(vec![
                SyntaxNode::assign("status", SyntaxNode::ident("REJECTED")),
                SyntaxNode::call("notify", vec![]),
            ]),
        );

        let rewrite = rule.rewrite(&node).unwrap();
        let SyntaxNode::Block { statements } = &rewrite.replacement else {
            panic!("expected block");
        };
        assert_eq!(statements.len(), 4);

        // Every guard runs the failure handling, then returns
        for guard in &statements[..3] {
            let SyntaxNode::If { then_branch, .. } = guard else {
                panic!("expected guard clause");
            };
            let SyntaxNode::Block { statements: body } = then_branch.as_ref() else {
                panic!("expected guard body block");
            };
            assert_eq!(body.len(), 3);
            let src = guard.to_source();
            assert!(src.contains("status = REJECTED;"));
            assert!(src.contains("notify();"));
            assert!(matches!(body[2], SyntaxNode::Return { .. }));
        }
        assert_eq!(statements[3].to_source(), "ship();\n");
    }

    #[test]
    fn test_rewrite_rejects_two_conjuncts() {
        let rule = CompoundConditionRule::new(3);
        let node = SyntaxNode::if_then(and_chain(&["x", "y"]), SyntaxNode::block(vec![]));
        let err = rule.rewrite(&node).unwrap_err();
        assert!(matches!(err, RewriteError::InvalidRewriteTarget { .. }));
    }
}
