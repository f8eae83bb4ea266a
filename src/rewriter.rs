//! Applying rule rewrites to methods
//!
//! Findings carry a path plus a structural fingerprint instead of a live
//! node handle. The rewriter resolves the path against the method it is
//! given at apply time and checks the fingerprint; a finding produced
//! against an older revision of the method is refused as stale rather
//! than silently rewriting the wrong node.
//!
//! Every rewrite produces a new method; the input is never mutated.

use crate::engine::Engine;
use crate::finding::Finding;
use crate::rule::Rule;
use crate::syntax::{Constant, Method, NodePath, SyntaxError};
use std::sync::Arc;

/// Why a rewrite could not be applied
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("rule '{rule}' does not provide a rewrite")]
    UnsupportedRewrite { rule: String },

    #[error("rule '{rule}' does not match the targeted node")]
    InvalidRewriteTarget { rule: String },

    #[error("finding at {path} refers to a node that no longer exists in this method")]
    StaleNodeReference { path: NodePath },

    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error(transparent)]
    Malformed(#[from] SyntaxError),
}

/// A rewritten method together with everything the rewrite produced
/// beyond the method body itself.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    /// The method with the targeted node replaced
    pub method: Method,
    /// Helper methods extracted by the rewrite, to be added alongside
    pub extracted: Vec<Method>,
}

/// Result of driving a method to a fix-point
#[derive(Debug, Clone)]
pub struct FixReport {
    /// The method after all applicable rewrites
    pub method: Method,
    /// Helper methods extracted along the way
    pub extracted: Vec<Method>,
    /// Total rewrites applied
    pub fixes_applied: usize,
    /// Scan passes taken to converge
    pub passes: usize,
}

impl FixReport {
    pub fn is_clean_pass(&self) -> bool {
        self.fixes_applied == 0
    }
}

/// Applies rule rewrites to methods
pub struct Rewriter {
    rules: Vec<Arc<dyn Rule>>,
}

/// Rewrite passes after which convergence is abandoned
///
/// Every built-in rewrite strictly reduces the matched shape, so a
/// well-behaved rule set converges in a handful of passes. The cap
/// turns a misbehaving rule into an error report instead of a loop.
const MAX_FIX_PASSES: usize = 32;

impl Rewriter {
    pub fn new(rules: Vec<Arc<dyn Rule>>) -> Self {
        Self { rules }
    }

    fn rule(&self, id: &str) -> Result<&Arc<dyn Rule>, RewriteError> {
        self.rules
            .iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| RewriteError::UnknownRule(id.to_string()))
    }

    /// Apply the rewrite for a single finding
    ///
    /// The finding must have been produced against `method` as it stands
    /// now: if the path no longer resolves, or resolves to a node whose
    /// fingerprint differs from the one recorded in the finding, the
    /// reference is stale and the rewrite is refused.
    pub fn apply(&self, method: &Method, finding: &Finding) -> Result<RewriteOutcome, RewriteError> {
        let rule = self.rule(&finding.rule_id)?;
        if !rule.has_rewrite() {
            return Err(RewriteError::UnsupportedRewrite {
                rule: finding.rule_id.clone(),
            });
        }

        let path = &finding.location.path;
        let node = method
            .body
            .node_at(path)
            .ok_or_else(|| RewriteError::StaleNodeReference { path: path.clone() })?;
        if node.fingerprint() != finding.fingerprint {
            return Err(RewriteError::StaleNodeReference { path: path.clone() });
        }

        let rewrite = rule.rewrite(node)?;
        let body = method
            .body
            .with_replacement(path, rewrite.replacement)
            .ok_or_else(|| RewriteError::StaleNodeReference { path: path.clone() })?;

        let mut constants = method.constants.clone();
        merge_constants(&mut constants, rewrite.new_constants);

        Ok(RewriteOutcome {
            method: Method {
                name: method.name.clone(),
                parameters: method.parameters.clone(),
                constants,
                body,
            },
            extracted: rewrite.extracted_methods,
        })
    }

    /// Rewrite a method to a fix-point
    ///
    /// Each pass rescans the current revision and applies the first
    /// fixable finding, so later findings are always produced against
    /// the tree they will be applied to. Passing `rule_id` restricts
    /// the passes to that rule's findings.
    pub fn fix_all(
        &self,
        engine: &Engine,
        method: &Method,
        rule_id: Option<&str>,
    ) -> Result<FixReport, RewriteError> {
        if let Some(id) = rule_id {
            // Fail up front on a typo rather than converging on nothing
            self.rule(id)?;
        }

        let mut current = method.clone();
        let mut extracted = Vec::new();
        let mut fixes_applied = 0;
        let mut passes = 0;

        loop {
            passes += 1;
            if passes > MAX_FIX_PASSES {
                log::warn!(
                    "method '{}' did not converge after {} passes",
                    current.name,
                    MAX_FIX_PASSES
                );
                break;
            }

            let result = engine.scan(&current)?;
            let next = result.findings.into_iter().find(|f| {
                f.fixable && rule_id.map_or(true, |id| f.rule_id == id)
            });
            let Some(finding) = next else {
                break;
            };

            log::debug!(
                "pass {}: applying {} at {}",
                passes,
                finding.rule_id,
                finding.location.path
            );
            let outcome = self.apply(&current, &finding)?;
            current = outcome.method;
            extracted.extend(outcome.extracted);
            fixes_applied += 1;
        }

        Ok(FixReport {
            method: current,
            extracted,
            fixes_applied,
            passes,
        })
    }
}

/// Append constants, unifying repeats of the same name
///
/// Value-derived constant names make repeated literals collide here on
/// purpose; the first occurrence wins and later ones are dropped.
fn merge_constants(existing: &mut Vec<Constant>, new: Vec<Constant>) {
    for constant in new {
        if !existing.iter().any(|c| c.name == constant.name) {
            existing.push(constant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Engine;
    use crate::finding::{Location, Severity};
    use crate::rules::RuleRegistry;
    use crate::syntax::{BinaryOp, LiteralValue, SyntaxNode};
    use pretty_assertions::assert_eq;

    fn engine() -> Engine {
        Engine::new(Config::default())
    }

    fn rewriter() -> Rewriter {
        Rewriter::new(RuleRegistry::standard().rules())
    }

    /// age > 18 buried in a guard
    fn magic_method() -> Method {
        Method::new(
            "check_age",
            vec!["age"],
            SyntaxNode::block(vec![SyntaxNode::if_then(
                SyntaxNode::binary(BinaryOp::Gt, SyntaxNode::ident("age"), SyntaxNode::int(18)),
                SyntaxNode::block(vec![SyntaxNode::ret(Some(SyntaxNode::boolean(true)))]),
            )]),
        )
    }

    #[test]
    fn test_apply_magic_number_rewrite() {
        let method = magic_method();
        let result = engine().scan(&method).unwrap();
        let finding = result
            .findings
            .iter()
            .find(|f| f.rule_id == "magic-number")
            .expect("magic number finding");

        let outcome = rewriter().apply(&method, finding).unwrap();
        assert_eq!(outcome.method.constants.len(), 1);
        assert_eq!(outcome.method.constants[0].name, "CONST_18");
        assert_eq!(outcome.method.constants[0].value, LiteralValue::Int(18));
        assert!(outcome
            .method
            .body
            .to_source()
            .contains("age > CONST_18"));
        // The original is untouched
        assert!(method.body.to_source().contains("age > 18"));
    }

    #[test]
    fn test_stale_finding_is_refused() {
        let method = magic_method();
        let result = engine().scan(&method).unwrap();
        let finding = result
            .findings
            .iter()
            .find(|f| f.rule_id == "magic-number")
            .expect("magic number finding");

        let r = rewriter();
        let outcome = r.apply(&method, finding).unwrap();

        // Same finding against the rewritten method: the node changed
        let err = r.apply(&outcome.method, finding).unwrap_err();
        assert!(matches!(err, RewriteError::StaleNodeReference { .. }));
    }

    #[test]
    fn test_fabricated_path_is_stale() {
        let method = magic_method();
        let finding = Finding::new(
            "magic-number",
            Severity::Info,
            "made up",
            Location::new("check_age", NodePath(vec![9, 9, 9])),
            0,
        );
        let err = rewriter().apply(&method, &finding).unwrap_err();
        assert!(matches!(err, RewriteError::StaleNodeReference { .. }));
    }

    #[test]
    fn test_unknown_rule_is_reported() {
        let method = magic_method();
        let finding = Finding::new(
            "no-such-rule",
            Severity::Info,
            "made up",
            Location::new("check_age", NodePath::root()),
            method.body.fingerprint(),
        );
        let err = rewriter().apply(&method, &finding).unwrap_err();
        assert!(matches!(err, RewriteError::UnknownRule(_)));
    }

    #[test]
    fn test_fix_all_reaches_fix_point() {
        let method = magic_method();
        let eng = engine();
        let report = rewriter().fix_all(&eng, &method, None).unwrap();

        assert!(report.fixes_applied >= 1);
        let rescan = eng.scan(&report.method).unwrap();
        assert!(rescan.is_clean(), "leftover: {:?}", rescan.findings);
    }

    #[test]
    fn test_fix_all_single_rule_filter() {
        // Nested chain whose innermost comparison holds a magic number
        let inner = SyntaxNode::if_then(
            SyntaxNode::binary(BinaryOp::Gt, SyntaxNode::ident("total"), SyntaxNode::int(100)),
            SyntaxNode::block(vec![SyntaxNode::call("approve", vec![])]),
        );
        let method = Method::new(
            "review",
            vec![],
            SyntaxNode::block(vec![SyntaxNode::if_then(
                SyntaxNode::ident("open"),
                SyntaxNode::block(vec![SyntaxNode::if_then(
                    SyntaxNode::ident("valid"),
                    SyntaxNode::block(vec![inner]),
                )]),
            )]),
        );

        let eng = engine();
        let report = rewriter()
            .fix_all(&eng, &method, Some("magic-number"))
            .unwrap();

        // The literal is gone but the nesting remains
        let rescan = eng.scan(&report.method).unwrap();
        assert!(rescan.findings.iter().all(|f| f.rule_id != "magic-number"));
        assert!(rescan
            .findings
            .iter()
            .any(|f| f.rule_id == "nested-conditional"));
    }

    #[test]
    fn test_fix_all_extracts_helper_methods() {
        // base subtotal computed twice in the same body
        let subtotal = SyntaxNode::binary(
            BinaryOp::Mul,
            SyntaxNode::ident("price"),
            SyntaxNode::ident("quantity"),
        );
        let method = Method::new(
            "order_total",
            vec!["price", "quantity"],
            SyntaxNode::block(vec![
                SyntaxNode::assign("total", subtotal.clone()),
                SyntaxNode::call("audit", vec![subtotal]),
                SyntaxNode::ret(Some(SyntaxNode::ident("total"))),
            ]),
        );

        let eng = engine();
        let report = rewriter().fix_all(&eng, &method, None).unwrap();

        assert_eq!(report.extracted.len(), 1);
        assert_eq!(report.extracted[0].name, "compute_price");
        assert!(report
            .method
            .body
            .to_source()
            .contains("compute_price()"));

        // Both the rewritten method and the helper scan clean
        assert!(eng.scan(&report.method).unwrap().is_clean());
        assert!(eng.scan(&report.extracted[0]).unwrap().is_clean());
    }

    #[test]
    fn test_fix_all_unknown_rule_filter() {
        let eng = engine();
        let err = rewriter()
            .fix_all(&eng, &magic_method(), Some("no-such-rule"))
            .unwrap_err();
        assert!(matches!(err, RewriteError::UnknownRule(_)));
    }

    #[test]
    fn test_merge_constants_unifies_names() {
        let mut existing = vec![Constant::new("CONST_18", LiteralValue::Int(18))];
        merge_constants(
            &mut existing,
            vec![
                Constant::new("CONST_18", LiteralValue::Int(18)),
                Constant::new("CONST_100", LiteralValue::Int(100)),
            ],
        );
        assert_eq!(existing.len(), 2);
    }
}
