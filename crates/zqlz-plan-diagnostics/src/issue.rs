//! Diagnostic issues found in a plan
//!
//! An [`Issue`] ties a detected anti-pattern to the node that triggered it,
//! with a [`Severity`] and a concrete remediation suggestion.

use crate::plan::{NodePath, PlanNode};
use serde::{Deserialize, Serialize};

/// Severity level for issues.
///
/// Variants are declared most severe first, so the derived ordering sorts
/// critical issues before warnings and warnings before info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Critical issue that should be addressed immediately
    Critical,
    /// Warning that may impact performance
    Warning,
    /// Informational note for optimization
    Info,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Warning, Severity::Info];

    /// Returns true if this is a critical issue
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }

    /// Returns true if this is at least a warning
    pub fn is_warning_or_above(&self) -> bool {
        matches!(self, Self::Critical | Self::Warning)
    }

    /// Returns the severity level as a display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Upper-case label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }

    /// Icon shown next to issues of this severity
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Critical => "🔴",
            Self::Warning => "⚠️",
            Self::Info => "ℹ️",
        }
    }
}

/// Kind of anti-pattern an issue reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// Planner row estimate is far from the measured row count
    RowEstimationError,
    /// A function wraps a column inside a comparison
    FunctionOnColumn,
    /// Every row of a table is read
    FullTableScan,
    /// Sort over a large number of rows
    LargeSort,
    /// Operation executed a very large number of times
    HighLoopCount,
}

impl IssueType {
    /// Returns a human-readable description of this issue type
    pub fn description(&self) -> &'static str {
        match self {
            Self::RowEstimationError => "Row estimate differs greatly from actual rows",
            Self::FunctionOnColumn => "Function applied to a column prevents index use",
            Self::FullTableScan => "Full table scan detected",
            Self::LargeSort => "Sort on large dataset",
            Self::HighLoopCount => "Operation repeated many times",
        }
    }
}

/// A single diagnostic finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Type of issue
    pub issue_type: IssueType,
    /// Severity level
    pub severity: Severity,
    /// Short title
    pub title: String,
    /// Explanation of what was detected
    pub message: String,
    /// Suggested action to resolve the issue
    pub suggestion: String,
    /// Operation text of the node that triggered the issue
    pub operation: String,
    /// Table of the triggering node, if known
    pub table: Option<String>,
    /// Location of the triggering node in the analyzed plan
    pub node_path: NodePath,
}

impl Issue {
    /// Creates an issue raised by `node`.
    ///
    /// The node path is left empty; the rule walker fills it in.
    pub fn new(
        issue_type: IssueType,
        severity: Severity,
        node: &PlanNode,
        title: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            title: title.into(),
            message: message.into(),
            suggestion: suggestion.into(),
            operation: node.operation_text.clone(),
            table: node.table_name.clone(),
            node_path: NodePath::default(),
        }
    }

    /// Sets the location of the triggering node
    pub fn at(mut self, path: NodePath) -> Self {
        self.node_path = path;
        self
    }

    /// Icon for this issue's severity
    pub fn severity_emoji(&self) -> &'static str {
        self.severity.emoji()
    }
}

/// Overall classification of a plan, derived from its worst issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Good,
    NeedsAttention,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Derives the status from a set of issues
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        match issues.into_iter().map(|issue| issue.severity).min() {
            Some(Severity::Critical) => Self::Critical,
            Some(Severity::Warning) => Self::Warning,
            Some(Severity::Info) => Self::NeedsAttention,
            None => Self::Good,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NeedsAttention => "needs_attention",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Returns true when no issue was found
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

#[cfg(test)]
mod tests;
