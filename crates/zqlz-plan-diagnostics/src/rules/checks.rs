//! Built-in diagnostic rules

use super::{DiagnosticRule, is_identifier};
use crate::error::{DiagnosticsError, Result};
use crate::issue::{Issue, IssueType, Severity};
use crate::plan::{OperationKind, PlanNode, format_rows};
use regex::Regex;
use std::sync::LazyLock;

pub const ROW_ESTIMATION_ERROR: &str = "row_estimation_error";
pub const FUNCTION_ON_COLUMN: &str = "function_on_column";
pub const FULL_TABLE_SCAN: &str = "full_table_scan";
pub const LARGE_SORT: &str = "large_sort";
pub const HIGH_LOOP_COUNT: &str = "high_loop_count";

static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<>|!=|<=|>=|=|<|>|\b(?:like|between|in)\b").expect("valid regex")
});

/// Column reference: `col`, `t.col`, `` `t`.`col` ``
const COLUMN_REFERENCE: &str = r"`?[A-Za-z_][\w$]*`?(?:\.`?[A-Za-z_][\w$]*`?)*";

/// Flags nodes whose row estimate is off by an order of magnitude
#[derive(Debug, Clone)]
pub struct RowEstimationRule {
    ratio_threshold: f64,
}

impl RowEstimationRule {
    pub fn new(ratio_threshold: f64) -> Self {
        Self { ratio_threshold }
    }
}

impl DiagnosticRule for RowEstimationRule {
    fn name(&self) -> &'static str {
        ROW_ESTIMATION_ERROR
    }

    fn check(&self, node: &PlanNode) -> Vec<Issue> {
        let (Some(estimated), Some(actual)) = (node.estimated_rows, node.actual_rows) else {
            return Vec::new();
        };

        // Floor both sides at one row so empty results don't divide by zero
        let estimated_floor = estimated.max(1.0);
        let actual_floor = (actual as f64).max(1.0);
        let ratio = estimated_floor.max(actual_floor) / estimated_floor.min(actual_floor);
        if ratio < self.ratio_threshold {
            return Vec::new();
        }

        let direction = if estimated_floor > actual_floor {
            "overestimated"
        } else {
            "underestimated"
        };
        let suggestion = match &node.table_name {
            Some(table) => format!(
                "Refresh statistics with ANALYZE TABLE {table} and consider histograms on the filtered columns so the optimizer sees the real data distribution"
            ),
            None => "Refresh table and index statistics (ANALYZE TABLE) and consider histograms on the filtered columns so the optimizer sees the real data distribution".to_string(),
        };

        vec![Issue::new(
            IssueType::RowEstimationError,
            Severity::Warning,
            node,
            "Row estimation error",
            format!(
                "Optimizer estimated {} rows but {} rows were returned ({ratio:.1}x {direction}) at '{}'",
                format_rows(estimated),
                actual,
                node.operation_text
            ),
            suggestion,
        )]
    }
}

/// Flags predicates that wrap a column in a function call
#[derive(Debug, Clone)]
pub struct FunctionOnColumnRule {
    functions: Vec<String>,
    pattern: Option<Regex>,
}

impl FunctionOnColumnRule {
    /// Creates the rule for the given function allow-list.
    ///
    /// Every name must be a plain identifier. An empty list yields a rule
    /// that never fires.
    pub fn new<S: AsRef<str>>(functions: &[S]) -> Result<Self> {
        let mut names = Vec::with_capacity(functions.len());
        for function in functions {
            let name = function.as_ref().trim();
            if !is_identifier(name) {
                return Err(DiagnosticsError::InvalidFunctionName(name.to_string()));
            }
            let name = name.to_lowercase();
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let pattern = if names.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
            let source = format!(
                r"(?i)\b({})\s*\(\s*({COLUMN_REFERENCE})\s*(\()?",
                alternatives.join("|")
            );
            // Names are validated identifiers, so the pattern always compiles
            Some(Regex::new(&source).map_err(|_| {
                DiagnosticsError::InvalidFunctionName(names.join(","))
            })?)
        };

        Ok(Self {
            functions: names,
            pattern,
        })
    }

    /// Functions this rule reports, lower-cased
    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    /// Returns the wrapped columns of a predicate, each one once
    fn wrapped_columns(&self, text: &str) -> Vec<WrappedColumn> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        if !COMPARISON.is_match(text) {
            return Vec::new();
        }

        let mut found: Vec<WrappedColumn> = Vec::new();
        for caps in pattern.captures_iter(text) {
            // A trailing "(" means the argument is itself a call, not a column
            if caps.get(3).is_some() {
                continue;
            }
            let (Some(whole), Some(function), Some(column)) =
                (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let column = column.as_str().replace('`', "");
            if is_literal_keyword(&column) {
                continue;
            }
            let function = function.as_str().to_lowercase();
            if found
                .iter()
                .any(|w| w.function == function && w.column == column)
            {
                continue;
            }
            let call = call_text(text, whole.start())
                .unwrap_or_else(|| whole.as_str().trim_end());
            found.push(WrappedColumn {
                function,
                column,
                call: call.to_string(),
            });
        }
        found
    }
}

#[derive(Debug, Clone, PartialEq)]
struct WrappedColumn {
    function: String,
    column: String,
    /// The call as written, e.g. `cast(s.enrolled_at as date)`
    call: String,
}

/// Text of the call starting at `start`, up to its balanced closing paren
fn call_text(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    for (offset, c) in text[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_literal_keyword(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "null" | "true" | "false" | "current_date" | "current_timestamp"
    )
}

impl DiagnosticRule for FunctionOnColumnRule {
    fn name(&self) -> &'static str {
        FUNCTION_ON_COLUMN
    }

    fn check(&self, node: &PlanNode) -> Vec<Issue> {
        self.wrapped_columns(&node.operation_text)
            .into_iter()
            .map(|WrappedColumn { function, column, call }| {
                Issue::new(
                    IssueType::FunctionOnColumn,
                    Severity::Warning,
                    node,
                    "Function on column",
                    format!(
                        "The predicate applies {function}() to column {column}, which makes it non-sargable: an index on {column} cannot be used to satisfy '{}'",
                        node.operation_text
                    ),
                    format!(
                        "Compare the bare column instead (for example rewrite the condition on {call} as a range condition on {column}), or add a functional index on the expression {call}"
                    ),
                )
            })
            .collect()
    }
}

/// Flags operations that read an entire table
#[derive(Debug, Clone, Copy, Default)]
pub struct FullTableScanRule;

impl DiagnosticRule for FullTableScanRule {
    fn name(&self) -> &'static str {
        FULL_TABLE_SCAN
    }

    fn check(&self, node: &PlanNode) -> Vec<Issue> {
        if node.operation_kind != OperationKind::TableScan {
            return Vec::new();
        }

        let target = node
            .table_name
            .as_deref()
            .map(|t| format!("'{t}'"))
            .unwrap_or_else(|| "an unnamed table".to_string());
        let rows = match (node.actual_rows, node.estimated_rows) {
            (Some(actual), _) => format!(", reading {actual} rows"),
            (None, Some(estimated)) => format!(", estimated at {} rows", format_rows(estimated)),
            (None, None) => String::new(),
        };

        // Unnamed scans read an internal temporary table built for grouping,
        // distinct or sorting
        let suggestion = match &node.table_name {
            Some(_) => format!(
                "Add an index on {target} covering the columns used in WHERE and JOIN conditions so the optimizer can avoid reading the whole table"
            ),
            None => "Add an index matching the GROUP BY / ORDER BY (or DISTINCT) columns so rows arrive in order and the internal temporary table is not needed".to_string(),
        };

        vec![Issue::new(
            IssueType::FullTableScan,
            Severity::Critical,
            node,
            "Full table scan",
            format!("Full table scan on {target}{rows}: every row is read to answer the query"),
            suggestion,
        )]
    }
}

/// Flags sorts over many rows
#[derive(Debug, Clone)]
pub struct LargeSortRule {
    min_rows: u64,
}

impl LargeSortRule {
    pub fn new(min_rows: u64) -> Self {
        Self { min_rows }
    }
}

impl DiagnosticRule for LargeSortRule {
    fn name(&self) -> &'static str {
        LARGE_SORT
    }

    fn check(&self, node: &PlanNode) -> Vec<Issue> {
        if node.operation_kind != OperationKind::Sort {
            return Vec::new();
        }
        let Some(rows) = node.row_count() else {
            return Vec::new();
        };
        if rows < self.min_rows as f64 {
            return Vec::new();
        }

        vec![Issue::new(
            IssueType::LargeSort,
            Severity::Info,
            node,
            "Large sort",
            format!(
                "Sort over {} rows at '{}'",
                format_rows(rows),
                node.operation_text
            ),
            "Add an index matching the ORDER BY columns to avoid the sort, or increase sort_buffer_size",
        )]
    }
}

/// Flags operations executed a very large number of times
#[derive(Debug, Clone)]
pub struct HighLoopCountRule {
    min_loops: u64,
}

impl HighLoopCountRule {
    pub fn new(min_loops: u64) -> Self {
        Self { min_loops }
    }
}

impl DiagnosticRule for HighLoopCountRule {
    fn name(&self) -> &'static str {
        HIGH_LOOP_COUNT
    }

    fn check(&self, node: &PlanNode) -> Vec<Issue> {
        let Some(loops) = node.loops else {
            return Vec::new();
        };
        if loops < self.min_loops {
            return Vec::new();
        }

        vec![Issue::new(
            IssueType::HighLoopCount,
            Severity::Info,
            node,
            "Repeated execution",
            format!("'{}' was executed {loops} times", node.operation_text),
            "Index the join column on the inner side of the loop or rewrite the query so the lookup runs once per set instead of once per row",
        )]
    }
}
