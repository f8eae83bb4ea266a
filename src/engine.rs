//! Core scan engine
//!
//! Walks each method body in pre-order and evaluates every enabled rule
//! at every node. Traversal order plus registration order make scan
//! output fully deterministic for a given input and rule set.

use crate::config::Config;
use crate::finding::{Finding, Location};
use crate::rule::Rule;
use crate::rules::RuleRegistry;
use crate::syntax::{Method, NodePath, SyntaxError};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-rule timing statistics
#[derive(Debug, Clone, Default)]
pub struct RuleTiming {
    /// Rule ID
    pub rule_id: String,
    /// Total time spent on this rule
    pub total_time: Duration,
    /// Number of nodes the rule was evaluated against
    pub evaluation_count: usize,
    /// Number of matches found
    pub match_count: usize,
}

impl RuleTiming {
    pub fn new(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            ..Default::default()
        }
    }

    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count > 0 {
            self.total_time / self.evaluation_count as u32
        } else {
            Duration::ZERO
        }
    }
}

/// Result of a scan
#[derive(Debug, Default)]
pub struct ScanResult {
    /// All findings, in method order then pre-order then rule order
    pub findings: Vec<Finding>,

    /// Methods scanned
    pub methods_scanned: usize,

    /// Methods with at least one finding
    pub methods_with_findings: usize,

    /// Total errors
    pub error_count: usize,

    /// Total warnings
    pub warning_count: usize,

    /// Total info messages
    pub info_count: usize,

    /// Processing duration
    pub duration: Duration,

    /// Per-rule timing statistics (rule_id -> timing)
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl ScanResult {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Get exit code (0 = clean, 1 = findings)
    pub fn exit_code(&self) -> i32 {
        if self.has_findings() {
            1
        } else {
            0
        }
    }

    /// Drop findings below `min` and recompute the summary counts so
    /// the reported totals describe what is actually reported
    pub fn retain_min_severity(&mut self, min: crate::finding::Severity) {
        use crate::finding::Severity;

        self.findings.retain(|f| f.severity >= min);
        self.error_count = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        self.warning_count = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count();
        self.info_count = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Info)
            .count();
        self.methods_with_findings = self
            .findings
            .iter()
            .map(|f| f.location.method.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ScanResult) {
        self.findings.extend(other.findings);
        self.methods_scanned += other.methods_scanned;
        self.methods_with_findings += other.methods_with_findings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;

        for (rule_id, timing) in other.rule_timings {
            let entry = self
                .rule_timings
                .entry(rule_id)
                .or_insert_with(|| RuleTiming::new(&timing.rule_id));
            entry.total_time += timing.total_time;
            entry.evaluation_count += timing.evaluation_count;
            entry.match_count += timing.match_count;
        }
    }

    /// Get rule timings sorted by total time (descending)
    pub fn sorted_timings(&self) -> Vec<&RuleTiming> {
        let mut timings: Vec<_> = self.rule_timings.values().collect();
        timings.sort_by(|a, b| b.total_time.cmp(&a.total_time));
        timings
    }

    /// Format timing statistics as a string
    pub fn format_timings(&self) -> String {
        let mut output = String::new();
        let timings = self.sorted_timings();

        if timings.is_empty() {
            return "No timing data available".to_string();
        }

        output.push_str("Rule Timing Statistics:\n");
        output.push_str(&format!(
            "{:<30} {:>12} {:>12} {:>10} {:>12}\n",
            "Rule ID", "Total", "Avg", "Evals", "Matches"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for timing in timings {
            let total_ms = timing.total_time.as_secs_f64() * 1000.0;
            let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;

            output.push_str(&format!(
                "{:<30} {:>10.2}ms {:>10.2}µs {:>10} {:>12}\n",
                timing.rule_id, total_ms, avg_us, timing.evaluation_count, timing.match_count
            ));
        }

        output
    }
}

/// The main scan engine
pub struct Engine {
    config: Config,
    rules: Vec<Arc<dyn Rule>>,
}

impl Engine {
    /// Create a new engine; rule thresholds come from the configuration
    pub fn new(config: Config) -> Self {
        let rules = RuleRegistry::with_config(&config).rules();
        Self { config, rules }
    }

    /// Create an engine with an explicit rule set
    pub fn with_rules(config: Config, rules: Vec<Arc<dyn Rule>>) -> Self {
        Self { config, rules }
    }

    /// Rules the engine evaluates, in registration order
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan a single method
    ///
    /// The method is validated before any rule runs, so rules and
    /// rewrites can rely on structural invariants (bodies are blocks,
    /// names are non-empty, decimals parse).
    pub fn scan(&self, method: &Method) -> Result<ScanResult, SyntaxError> {
        let start = Instant::now();
        crate::syntax::validate(method)?;

        let mut result = ScanResult {
            methods_scanned: 1,
            ..Default::default()
        };

        // Paths already reported by rules that suppress descendant
        // matches; pre-order guarantees ancestors are seen first.
        let mut suppressed: HashMap<String, Vec<NodePath>> = HashMap::new();

        for (path, node) in method.body.walk() {
            for rule in &self.rules {
                let id = rule.id();
                if !self.config.is_rule_enabled(id) {
                    continue;
                }

                let rule_start = Instant::now();
                let matched = rule.matches(node);
                let timing = result
                    .rule_timings
                    .entry(id.to_string())
                    .or_insert_with(|| RuleTiming::new(id));
                timing.total_time += rule_start.elapsed();
                timing.evaluation_count += 1;

                if !matched {
                    continue;
                }
                if rule.report_outermost_only() {
                    let roots = suppressed.entry(id.to_string()).or_default();
                    if roots.iter().any(|r| path.starts_with(r)) {
                        continue;
                    }
                    roots.push(path.clone());
                }
                timing.match_count += 1;

                let severity = self
                    .config
                    .get_severity_override(id)
                    .unwrap_or(rule.meta().severity);
                let mut finding = Finding::new(
                    id,
                    severity,
                    &rule.message(node),
                    Location::new(&method.name, path.clone()),
                    node.fingerprint(),
                )
                .with_excerpt(&node.to_source())
                .with_help(&rule.meta().description);
                if rule.has_rewrite() {
                    finding = finding.fixable();
                }

                match finding.severity {
                    crate::finding::Severity::Error => result.error_count += 1,
                    crate::finding::Severity::Warning => result.warning_count += 1,
                    crate::finding::Severity::Info => result.info_count += 1,
                }
                result.findings.push(finding);
            }
        }

        if result.has_findings() {
            result.methods_with_findings = 1;
        }
        result.duration = start.elapsed();
        Ok(result)
    }

    /// Scan multiple methods
    ///
    /// Methods are scanned in parallel when configured, but results are
    /// merged in input order so the combined finding list stays
    /// deterministic.
    pub fn scan_all(&self, methods: &[Method]) -> Result<ScanResult, SyntaxError> {
        let start = Instant::now();

        let results: Vec<Result<ScanResult, SyntaxError>> = if self.config.engine.parallel {
            let threads = if self.config.engine.jobs > 0 {
                self.config.engine.jobs
            } else {
                num_cpus::get()
            };
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| methods.par_iter().map(|m| self.scan(m)).collect()),
                Err(e) => {
                    log::warn!("thread pool setup failed, scanning serially: {}", e);
                    methods.iter().map(|m| self.scan(m)).collect()
                }
            }
        } else {
            methods.iter().map(|m| self.scan(m)).collect()
        };

        let mut combined = ScanResult::default();
        for result in results {
            combined.merge(result?);
        }

        combined.duration = start.elapsed();
        Ok(combined)
    }
}
