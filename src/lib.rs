//! Refit - rule-based code quality scanner with structural rewrites
//!
//! Refit scans method bodies, represented as persistent syntax trees,
//! for structural smells: deeply nested conditionals, overlong AND
//! conditions, repeated computations, and magic numbers. Every rule can
//! also rewrite what it finds, producing a new tree while the original
//! stays untouched.
//!
//! # Architecture
//!
//! ```text
//! CLI/API -> Engine -> Rules -> Findings
//!                          \-> Rewriter -> new Method (+ constants, helpers)
//! ```
//!
//! The engine loads configuration, evaluates every enabled rule at every
//! node of every method, and collects findings. Findings address their
//! node by path plus fingerprint, so the rewriter can refuse findings
//! made against an older revision of a method.

pub mod config;
pub mod engine;
pub mod finding;
pub mod output;
pub mod rewriter;
pub mod rule;
pub mod rules;
pub mod syntax;
pub mod unit;

// Re-export main types
pub use config::{ColorMode, Config, ConfigError, OutputFormat};
pub use engine::{Engine, RuleTiming, ScanResult};
pub use finding::{Finding, Location, Severity};
pub use output::{CompactFormatter, JsonFormatter, OutputFormatter, TextFormatter};
pub use rewriter::{FixReport, RewriteError, RewriteOutcome, Rewriter};
pub use rule::{Rewrite, Rule, RuleCategory, RuleMeta};
pub use rules::{registry, RuleRegistry};
pub use syntax::{
    BinaryOp, Constant, LiteralValue, Method, NodePath, SyntaxError, SyntaxNode, UnaryOp,
};
pub use unit::{SourceUnit, UnitError};
