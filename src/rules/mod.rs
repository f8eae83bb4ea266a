//! Built-in rules and the process-wide rule registry

mod compound_condition;
mod magic_number;
mod nested_conditional;
mod repeated_subexpression;

pub use compound_condition::CompoundConditionRule;
pub use magic_number::MagicNumberRule;
pub use nested_conditional::NestedConditionalRule;
pub use repeated_subexpression::RepeatedSubexpressionRule;

use crate::config::Config;
use crate::rule::Rule;
use std::sync::{Arc, OnceLock};

/// An ordered, immutable collection of rules
///
/// Registration order is the tie-break for overlapping matches on the
/// same node: findings at a node are emitted in this order.
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// The standard rule set with default thresholds
    pub fn standard() -> Self {
        Self::with_config(&Config::default())
    }

    /// Build the rule set with thresholds taken from configuration
    pub fn with_config(config: &Config) -> Self {
        let t = &config.thresholds;
        let rules: Vec<Arc<dyn Rule>> = vec![
            Arc::new(NestedConditionalRule::new(t.max_nesting_depth)),
            Arc::new(CompoundConditionRule::new(t.max_conjuncts)),
            Arc::new(RepeatedSubexpressionRule::new()),
            Arc::new(MagicNumberRule::new(t.allowed_numbers.clone())),
        ];
        Self { rules }
    }

    /// Rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    /// Look up a rule by id
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Clone the rule list (the rules themselves are shared)
    pub fn rules(&self) -> Vec<Arc<dyn Rule>> {
        self.rules.clone()
    }
}

/// The process-wide registry, built once on first use and read-only
/// thereafter; safe for unsynchronized concurrent reads.
pub fn registry() -> &'static RuleRegistry {
    static REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(RuleRegistry::standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registration_order() {
        let reg = RuleRegistry::standard();
        let ids: Vec<&str> = reg.iter().map(|r| r.id()).collect();
        assert_eq!(
            ids,
            vec![
                "nested-conditional",
                "compound-condition",
                "repeated-subexpression",
                "magic-number",
            ]
        );
    }

    #[test]
    fn test_registry_lookup() {
        let reg = RuleRegistry::standard();
        assert!(reg.get("magic-number").is_some());
        assert!(reg.get("no-such-rule").is_none());
        assert_eq!(reg.len(), 4);
        assert!(!reg.is_empty());
    }

    #[test]
    fn test_global_registry_is_stable() {
        let a = registry() as *const RuleRegistry;
        let b = registry() as *const RuleRegistry;
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_rules_have_examples() {
        // Every built-in rule documents its bad/good pair for `explain`.
        for rule in RuleRegistry::standard().iter() {
            let meta = rule.meta();
            assert!(meta.example_bad.is_some(), "{} lacks bad example", meta.id);
            assert!(meta.example_good.is_some(), "{} lacks good example", meta.id);
        }
    }
}
