//! Repeated computations and the extract-query rewrite

use crate::finding::Severity;
use crate::rewriter::RewriteError;
use crate::rule::{Rewrite, Rule, RuleCategory, RuleMeta};
use crate::syntax::{Method, NodePath, SyntaxNode};
use std::collections::HashMap;

/// Flags blocks that compute the same aggregate expression more than
/// once, or park it in a single-use temporary, and extracts the
/// computation into a named query method.
///
/// A candidate computation is an arithmetic expression or a call with
/// arguments; zero-argument calls are already queries and never flagged,
/// which is what makes the rewrite a fix-point.
pub struct RepeatedSubexpressionRule {
    meta: RuleMeta,
}

/// What the rule found inside a matched block
enum Target {
    /// The same expression computed in two or more statements
    Duplicate(SyntaxNode),
    /// `index`th statement assigns a computation to a name used once
    SingleUseTemp { index: usize, name: String },
}

impl Default for RepeatedSubexpressionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RepeatedSubexpressionRule {
    pub fn new() -> Self {
        let meta = RuleMeta::new(
            "repeated-subexpression",
            "Repeated subexpression",
            "The same computation appears more than once",
        )
        .with_severity(Severity::Warning)
        .with_category(RuleCategory::Duplication)
        .with_rationale(
            "Two copies of a computation drift apart under maintenance. A \
             named query method gives the computation one home and its \
             callers one honest name.",
        )
        .with_example_bad(
            "total = base(order) + tax(order);\nlog(base(order) + tax(order));",
        )
        .with_example_good(
            "total = final_amount(order);\nlog(final_amount(order));\n\nfinal_amount(order) {\n    return base(order) + tax(order);\n}",
        );

        Self { meta }
    }

    fn is_candidate(node: &SyntaxNode) -> bool {
        match node {
            SyntaxNode::BinaryExpr { op, .. } => op.is_arithmetic(),
            SyntaxNode::MethodCall { arguments, .. } => !arguments.is_empty(),
            _ => false,
        }
    }

    /// Find what to extract in a block, if anything
    ///
    /// Duplicates win over single-use temps; among duplicates the first
    /// expression to reach two occurrences wins, keeping scans
    /// deterministic. Occurrences are counted per node, so a computation
    /// repeated within one statement still counts as a duplicate.
    fn find_target(node: &SyntaxNode) -> Option<Target> {
        let SyntaxNode::Block { statements } = node else {
            return None;
        };

        // Candidate fingerprint -> (first example, occurrences)
        let mut seen: HashMap<u64, (SyntaxNode, usize)> = HashMap::new();
        let mut first_dup: Option<SyntaxNode> = None;

        for stmt in statements {
            for (_, descendant) in stmt.walk() {
                if !Self::is_candidate(descendant) {
                    continue;
                }
                let entry = seen
                    .entry(descendant.fingerprint())
                    .or_insert((descendant.clone(), 0));
                entry.1 += 1;
                if entry.1 == 2
                    && first_dup.is_none()
                    && !Self::operands_reassigned(statements, &entry.0)
                {
                    first_dup = Some(entry.0.clone());
                }
            }
        }

        if let Some(expr) = first_dup {
            return Some(Target::Duplicate(expr));
        }

        // Single-use temporary: assigned a computation once, read once,
        // never written again, with the computation's inputs untouched
        // between the assignment and the read.
        for (idx, stmt) in statements.iter().enumerate() {
            let SyntaxNode::Assignment { target, value } = stmt else {
                continue;
            };
            if !Self::is_candidate(value) {
                continue;
            }
            let rest = &statements[idx + 1..];
            let reads: usize = rest
                .iter()
                .flat_map(|s| s.walk())
                .filter(|(_, n)| matches!(n, SyntaxNode::Identifier { name } if name == target))
                .count();
            let rewrites = rest.iter().any(|s| {
                s.walk().any(
                    |(_, n)| matches!(n, SyntaxNode::Assignment { target: t, .. } if t == target),
                )
            });
            if reads == 1 && !rewrites && !Self::operands_reassigned(rest, value) {
                return Some(Target::SingleUseTemp {
                    index: idx,
                    name: target.clone(),
                });
            }
        }

        None
    }

    /// True when any identifier read by `expr` is assigned somewhere in
    /// `statements`. Re-evaluating the expression at a different point
    /// would then see a different value, so extraction must stand down.
    fn operands_reassigned(statements: &[SyntaxNode], expr: &SyntaxNode) -> bool {
        let operands: Vec<&str> = expr
            .walk()
            .filter_map(|(_, n)| match n {
                SyntaxNode::Identifier { name } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        statements.iter().flat_map(|s| s.walk()).any(|(_, n)| {
            matches!(n, SyntaxNode::Assignment { target, .. }
                if operands.iter().any(|o| o == target))
        })
    }

    /// Query-method name derived from the extracted expression
    fn query_name(expr: &SyntaxNode) -> String {
        match expr {
            SyntaxNode::MethodCall { name, .. } => format!("compute_{}", name),
            _ => expr
                .walk()
                .find_map(|(_, n)| match n {
                    SyntaxNode::Identifier { name } => Some(format!("compute_{}", name)),
                    _ => None,
                })
                .unwrap_or_else(|| "compute_value".to_string()),
        }
    }

    /// Replace every occurrence of `expr` under `root` with `with`
    ///
    /// Identical subtrees cannot overlap, so the collected paths are
    /// disjoint and can be spliced one by one.
    fn replace_occurrences(root: &SyntaxNode, expr: &SyntaxNode, with: &SyntaxNode) -> SyntaxNode {
        let fp = expr.fingerprint();
        let paths: Vec<NodePath> = root
            .walk()
            .filter(|(_, n)| n.fingerprint() == fp)
            .map(|(p, _)| p)
            .collect();

        let mut out = root.clone();
        for path in paths {
            if let Some(updated) = out.with_replacement(&path, with.clone()) {
                out = updated;
            }
        }
        out
    }
}

impl Rule for RepeatedSubexpressionRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn matches(&self, node: &SyntaxNode) -> bool {
        Self::find_target(node).is_some()
    }

    fn message(&self, node: &SyntaxNode) -> String {
        match Self::find_target(node) {
            Some(Target::Duplicate(expr)) => format!(
                "Computation '{}' appears more than once; extract a query method",
                expr.to_source()
            ),
            Some(Target::SingleUseTemp { name, .. }) => format!(
                "Temporary '{}' is computed and read once; replace with a query method",
                name
            ),
            None => self.meta.description.clone(),
        }
    }

    fn has_rewrite(&self) -> bool {
        true
    }

    fn report_outermost_only(&self) -> bool {
        true
    }

    fn rewrite(&self, node: &SyntaxNode) -> Result<Rewrite, RewriteError> {
        let Some(target) = Self::find_target(node) else {
            return Err(RewriteError::InvalidRewriteTarget {
                rule: self.meta.id.clone(),
            });
        };

        match target {
            Target::Duplicate(expr) => {
                let name = Self::query_name(&expr);
                let call = SyntaxNode::call(&name, vec![]);
                let replacement = Self::replace_occurrences(node, &expr, &call);
                let helper = Method {
                    name,
                    parameters: Vec::new(),
                    constants: Vec::new(),
                    body: SyntaxNode::block(vec![SyntaxNode::ret(Some(expr))]),
                };
                Ok(Rewrite {
                    replacement,
                    new_constants: Vec::new(),
                    extracted_methods: vec![helper],
                })
            }
            Target::SingleUseTemp { index, name } => {
                let SyntaxNode::Block { statements } = node else {
                    unreachable!("find_target() admits only blocks");
                };
                let SyntaxNode::Assignment { value, .. } = &statements[index] else {
                    unreachable!("target indexes an assignment");
                };

                let query = format!("compute_{}", name);
                let call = SyntaxNode::call(&query, vec![]);
                let temp_read = SyntaxNode::ident(&name);

                let mut out = Vec::with_capacity(statements.len() - 1);
                for (i, stmt) in statements.iter().enumerate() {
                    if i == index {
                        continue;
                    }
                    out.push(Self::replace_occurrences(stmt, &temp_read, &call));
                }

                let helper = Method {
                    name: query,
                    parameters: Vec::new(),
                    constants: Vec::new(),
                    body: SyntaxNode::block(vec![SyntaxNode::ret(Some(value.as_ref().clone()))]),
                };
                Ok(Rewrite {
                    replacement: SyntaxNode::block(out),
                    new_constants: Vec::new(),
                    extracted_methods: vec![helper],
                })
            }
        }
    }
}
