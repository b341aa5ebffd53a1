//! Analysis Result - a parsed plan together with its diagnostic issues

use crate::error::Result;
use crate::issue::{HealthStatus, Issue, Severity};
use crate::plan::{PlanNode, PlanNodeIterator};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Result of analyzing one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Root nodes of the plan (normally exactly one)
    pub roots: Vec<PlanNode>,
    /// Issues in the order the rules reported them
    pub issues: Vec<Issue>,
}

impl AnalysisResult {
    /// Creates a result from parsed roots and their issues
    pub fn new(roots: Vec<PlanNode>, issues: Vec<Issue>) -> Self {
        Self { roots, issues }
    }

    /// Result for input that contained no plan lines
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Returns true when there was no plan data to analyze
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Wall-clock duration of the plan: the end time of the first root, in
    /// milliseconds, or `0.0` when it was not reported
    pub fn total_time(&self) -> f64 {
        self.roots
            .first()
            .and_then(|root| root.actual_time_end)
            .unwrap_or(0.0)
    }

    /// Overall health derived from the worst issue
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_issues(&self.issues)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Returns true if there are critical issues
    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_critical())
    }

    /// Issues sorted most severe first; order within a severity is preserved
    pub fn issues_by_severity(&self) -> Vec<&Issue> {
        let mut sorted: Vec<_> = self.issues.iter().collect();
        sorted.sort_by_key(|issue| issue.severity);
        sorted
    }

    /// Number of issues with the given severity
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Returns an iterator over all nodes in the plan (depth-first)
    pub fn iter_nodes(&self) -> PlanNodeIterator<'_> {
        PlanNodeIterator::new(&self.roots)
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|r| r.node_count()).sum()
    }

    /// The node that raised `issue`, if the issue belongs to this result
    pub fn source_node(&self, issue: &Issue) -> Option<&PlanNode> {
        issue.node_path.resolve(&self.roots)
    }

    /// Structured export including the derived fields
    pub fn to_json(&self) -> Result<Value> {
        Ok(json!({
            "total_time_ms": self.total_time(),
            "node_count": self.node_count(),
            "health_status": self.health_status(),
            "issue_counts": {
                "critical": self.count_by_severity(Severity::Critical),
                "warning": self.count_by_severity(Severity::Warning),
                "info": self.count_by_severity(Severity::Info),
            },
            "issues": serde_json::to_value(&self.issues)?,
            "roots": serde_json::to_value(&self.roots)?,
        }))
    }
}

#[cfg(test)]
mod tests;
