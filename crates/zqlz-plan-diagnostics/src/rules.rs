//! Diagnostic Rules - detection of plan anti-patterns
//!
//! Each rule looks at one [`PlanNode`] at a time and reports zero or more
//! [`Issue`]s. Rules are collected in a [`RuleRegistry`], which walks the
//! plan once in pre-order and runs every rule on every node. New rules are
//! added by implementing [`DiagnosticRule`] and registering them; existing
//! rules are never touched.

mod checks;

pub use checks::*;

use crate::error::{DiagnosticsError, Result};
use crate::issue::Issue;
use crate::plan::{NodePath, PlanNode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A single, independent plan check
pub trait DiagnosticRule: Send + Sync + fmt::Debug {
    /// Stable identifier, used to disable the rule through configuration
    fn name(&self) -> &'static str;

    /// Inspects one node and returns the issues it triggers
    fn check(&self, node: &PlanNode) -> Vec<Issue>;
}

/// Functions that commonly wrap a column in a predicate
pub const DEFAULT_WRAPPING_FUNCTIONS: &[&str] = &[
    "cast",
    "convert",
    "date",
    "year",
    "month",
    "day",
    "lower",
    "upper",
    "trim",
    "substring",
    "substr",
    "date_format",
    "coalesce",
    "ifnull",
    "abs",
];

/// Configuration for the built-in rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticConfig {
    /// Estimated/actual row ratio at or above which the estimate is flagged
    pub row_estimation_ratio: f64,
    /// Functions reported when they wrap a column inside a comparison
    pub wrapping_functions: Vec<String>,
    /// Row count at or above which a sort is reported
    pub large_sort_rows: u64,
    /// Loop count at or above which an operation is reported
    pub high_loop_count: u64,
    /// Names of rules that should not run
    pub disabled_rules: Vec<String>,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            row_estimation_ratio: 10.0,
            wrapping_functions: DEFAULT_WRAPPING_FUNCTIONS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            large_sort_rows: 10_000,
            high_loop_count: 1_000,
            disabled_rules: Vec::new(),
        }
    }
}

impl DiagnosticConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row estimation ratio threshold
    pub fn with_row_estimation_ratio(mut self, ratio: f64) -> Self {
        self.row_estimation_ratio = ratio;
        self
    }

    /// Replaces the function allow-list
    pub fn with_wrapping_functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wrapping_functions = functions.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one function to the allow-list
    pub fn with_wrapping_function(mut self, function: impl Into<String>) -> Self {
        self.wrapping_functions.push(function.into());
        self
    }

    /// Sets the large sort threshold
    pub fn with_large_sort_rows(mut self, rows: u64) -> Self {
        self.large_sort_rows = rows;
        self
    }

    /// Sets the high loop count threshold
    pub fn with_high_loop_count(mut self, loops: u64) -> Self {
        self.high_loop_count = loops;
        self
    }

    /// Prevents the named rule from being registered
    pub fn disable_rule(mut self, name: impl Into<String>) -> Self {
        self.disabled_rules.push(name.into());
        self
    }

    /// Returns true if the named rule is enabled
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled_rules.iter().any(|d| d == name)
    }

    /// Checks thresholds and function names
    pub fn validate(&self) -> Result<()> {
        if !self.row_estimation_ratio.is_finite() || self.row_estimation_ratio < 1.0 {
            return Err(DiagnosticsError::InvalidThreshold {
                name: "row_estimation_ratio",
                value: self.row_estimation_ratio,
            });
        }
        if let Some(bad) = self
            .wrapping_functions
            .iter()
            .find(|f| !is_identifier(f))
        {
            return Err(DiagnosticsError::InvalidFunctionName(bad.clone()));
        }
        Ok(())
    }
}

/// Returns true for plain SQL identifiers (`date_format`, `CAST`, ...)
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Ordered collection of diagnostic rules
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn DiagnosticRule>>,
}

impl RuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a registry with all built-in rules enabled by `config`
    pub fn with_defaults(config: &DiagnosticConfig) -> Self {
        let mut registry = Self::new();

        if config.is_enabled(ROW_ESTIMATION_ERROR) {
            let ratio = if config.row_estimation_ratio.is_finite()
                && config.row_estimation_ratio >= 1.0
            {
                config.row_estimation_ratio
            } else {
                tracing::warn!(
                    ratio = config.row_estimation_ratio,
                    "invalid row estimation ratio, using default"
                );
                DiagnosticConfig::default().row_estimation_ratio
            };
            registry.register(RowEstimationRule::new(ratio));
        }

        if config.is_enabled(FUNCTION_ON_COLUMN) {
            let functions: Vec<&str> = config
                .wrapping_functions
                .iter()
                .map(String::as_str)
                .filter(|f| {
                    let valid = is_identifier(f);
                    if !valid {
                        tracing::warn!(function = %f, "skipping invalid wrapping function name");
                    }
                    valid
                })
                .collect();
            match FunctionOnColumnRule::new(&functions) {
                Ok(rule) => registry.register(rule),
                Err(err) => tracing::warn!(%err, "function-on-column rule disabled"),
            }
        }

        if config.is_enabled(FULL_TABLE_SCAN) {
            registry.register(FullTableScanRule);
        }

        if config.is_enabled(LARGE_SORT) {
            registry.register(LargeSortRule::new(config.large_sort_rows));
        }

        if config.is_enabled(HIGH_LOOP_COUNT) {
            registry.register(HighLoopCountRule::new(config.high_loop_count));
        }

        registry
    }

    /// Register a new rule; it runs after every rule registered before it
    pub fn register(&mut self, rule: impl DiagnosticRule + 'static) {
        tracing::debug!(rule = rule.name(), "registering diagnostic rule");
        self.rules.push(Arc::new(rule));
    }

    /// Builder form of [`RuleRegistry::register`]
    pub fn with_rule(mut self, rule: impl DiagnosticRule + 'static) -> Self {
        self.register(rule);
        self
    }

    /// Names of the registered rules, in run order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule on every node in a single pre-order walk.
    ///
    /// Issues are returned in walk order; for one node, in rule order. Each
    /// issue is stamped with the path of the node that raised it.
    pub fn diagnose(&self, roots: &[PlanNode]) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut path: Vec<usize> = Vec::new();
        // (node, tree level, index among its siblings)
        let mut stack: Vec<(&PlanNode, usize, usize)> =
            roots.iter().enumerate().rev().map(|(i, root)| (root, 0, i)).collect();

        while let Some((node, level, index)) = stack.pop() {
            path.truncate(level);
            path.push(index);

            for rule in &self.rules {
                let found = rule.check(node);
                if !found.is_empty() {
                    let at = NodePath::from(path.clone());
                    issues.extend(found.into_iter().map(|issue| issue.at(at.clone())));
                }
            }

            stack.extend(
                node.children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, child)| (child, level + 1, i)),
            );
        }
        issues
    }
}
