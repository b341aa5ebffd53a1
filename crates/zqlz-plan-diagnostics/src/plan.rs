//! Plan Node Model - Data structures for representing profiled execution plans
//!
//! A plan is a forest of [`PlanNode`]s reconstructed from indentation. Each
//! node keeps the raw line it came from, the descriptive operation text, a
//! coarse [`OperationKind`] and whatever estimate/actual statistics the line
//! carried. Every statistic is optional: `None` means "not reported", which
//! is different from a reported zero.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Ordered operation patterns, evaluated top to bottom. The first match wins,
/// so more specific shapes (index access) must come before generic ones.
static OPERATION_PATTERNS: LazyLock<Vec<(Regex, OperationKind)>> = LazyLock::new(|| {
    [
        (r"(?i)\bindex lookup\b", OperationKind::IndexLookup),
        (r"(?i)\bindex (?:range |skip )?scan\b", OperationKind::IndexScan),
        (
            r"(?i)^(?:table|full|seq|sequential) scan\b",
            OperationKind::TableScan,
        ),
        (r"(?i)^filter\b", OperationKind::Filter),
        (r"(?i)\baggregate\b|^group\b", OperationKind::Aggregate),
        (r"(?i)^limit\b", OperationKind::Limit),
        (r"(?i)\b(?:file)?sort\b", OperationKind::Sort),
        (r"(?i)\bjoin\b|^nested loop\b", OperationKind::Join),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("valid regex"), kind))
    .collect()
});

static TABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bon\s+(\w+)").expect("valid regex"));

static INDEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\busing\s+(\w+)").expect("valid regex"));

/// Coarse classification of what a plan node does
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    TableScan,
    IndexLookup,
    IndexScan,
    Filter,
    Aggregate,
    Limit,
    Sort,
    Join,
    Other,
}

impl OperationKind {
    /// Classifies operation text using the ordered pattern table
    pub fn classify(operation_text: &str) -> Self {
        let text = operation_text.trim();
        OPERATION_PATTERNS
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Other)
    }

    /// Returns a human-readable description of this operation kind
    pub fn description(&self) -> &'static str {
        match self {
            Self::TableScan => "Table scan (reads every row)",
            Self::IndexLookup => "Index lookup (equality access through an index)",
            Self::IndexScan => "Index scan (range or full walk over an index)",
            Self::Filter => "Filter (discards rows not matching a predicate)",
            Self::Aggregate => "Aggregate (grouping or summarising rows)",
            Self::Limit => "Limit (restricts output rows)",
            Self::Sort => "Sort",
            Self::Join => "Join",
            Self::Other => "Other operation",
        }
    }

    /// Returns true for operations that read rows from storage
    pub fn is_access(&self) -> bool {
        matches!(self, Self::TableScan | Self::IndexLookup | Self::IndexScan)
    }

    /// Returns true for operations that go through an index
    pub fn uses_index(&self) -> bool {
        matches!(self, Self::IndexLookup | Self::IndexScan)
    }
}

/// Location of a node inside a plan forest: the root index followed by the
/// child index at each level below it
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path of the root at `index`
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of this node's child at `index`
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Tree level of the addressed node (roots are level 0)
    pub fn level(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Resolves this path against a list of roots
    pub fn resolve<'a>(&self, roots: &'a [PlanNode]) -> Option<&'a PlanNode> {
        let (first, rest) = self.0.split_first()?;
        let mut node = roots.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// A single operator line of a profiled plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanNode {
    /// Indentation of the source line (leading whitespace before the marker)
    pub depth: usize,
    /// The original line
    pub raw_text: String,
    /// Descriptive part of the line, without the annotation groups
    pub operation_text: String,
    /// Classified operation
    pub operation_kind: OperationKind,
    /// Table the operation reads, if the text names one
    pub table_name: Option<String>,
    /// Index used, for index access operations
    pub index_name: Option<String>,
    /// Planner cost estimate
    pub estimated_cost: Option<f64>,
    /// Planner row estimate
    pub estimated_rows: Option<f64>,
    /// Time to first row in milliseconds
    pub actual_time_start: Option<f64>,
    /// Time to last row in milliseconds
    pub actual_time_end: Option<f64>,
    /// Rows actually produced (per loop)
    pub actual_rows: Option<u64>,
    /// Number of times the operation was executed
    pub loops: Option<u64>,
    /// Child nodes, in source order
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Creates a node from its depth, source line and operation text.
    ///
    /// The operation kind, table and index are derived from the operation
    /// text; statistics start out unset.
    pub fn new(
        depth: usize,
        raw_text: impl Into<String>,
        operation_text: impl Into<String>,
    ) -> Self {
        let operation_text = operation_text.into();
        let operation_kind = OperationKind::classify(&operation_text);

        // Only look at the head of the text so that names inside conditions
        // like "(t.id = o.user_id)" are never mistaken for the accessed table.
        let head = operation_text
            .split('(')
            .next()
            .unwrap_or(operation_text.as_str());
        let table_name = capture(&TABLE_PATTERN, head);
        let index_name = if operation_kind.uses_index() {
            capture(&INDEX_PATTERN, head)
        } else {
            None
        };

        Self {
            depth,
            raw_text: raw_text.into(),
            operation_text,
            operation_kind,
            table_name,
            index_name,
            estimated_cost: None,
            estimated_rows: None,
            actual_time_start: None,
            actual_time_end: None,
            actual_rows: None,
            loops: None,
            children: Vec::new(),
        }
    }

    /// Creates a node whose raw text is the operation text itself
    pub fn from_operation(depth: usize, operation_text: impl Into<String>) -> Self {
        let operation_text = operation_text.into();
        Self::new(depth, operation_text.clone(), operation_text)
    }

    /// Sets the planner estimates
    pub fn with_estimate(mut self, cost: f64, rows: f64) -> Self {
        self.estimated_cost = Some(cost);
        self.estimated_rows = Some(rows);
        self
    }

    /// Sets the measured statistics
    pub fn with_actual(mut self, start: f64, end: f64, rows: u64, loops: u64) -> Self {
        self.actual_time_start = Some(start);
        self.actual_time_end = Some(end);
        self.actual_rows = Some(rows);
        self.loops = Some(loops);
        self
    }

    /// Adds a child node
    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the total number of nodes in this subtree (including self)
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Returns the number of tree levels in this subtree
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Returns true if this is a leaf node (no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true if this node reads rows from a table or index
    pub fn is_scan(&self) -> bool {
        self.operation_kind.is_access()
    }

    /// Returns true if the line carried an `actual time=` group
    pub fn has_actual_stats(&self) -> bool {
        self.actual_time_end.is_some()
    }

    /// Returns true if the line carried a `cost=` group
    pub fn has_estimates(&self) -> bool {
        self.estimated_cost.is_some() || self.estimated_rows.is_some()
    }

    /// Time between first and last row, when both are known
    pub fn actual_duration(&self) -> Option<f64> {
        match (self.actual_time_start, self.actual_time_end) {
            (Some(start), Some(end)) => Some((end - start).max(0.0)),
            _ => None,
        }
    }

    /// Best known row count: measured rows, else the planner estimate
    pub fn row_count(&self) -> Option<f64> {
        self.actual_rows
            .map(|rows| rows as f64)
            .or(self.estimated_rows)
    }

    /// Returns an iterator over this subtree (depth-first, pre-order)
    pub fn iter(&self) -> PlanNodeIterator<'_> {
        PlanNodeIterator::new(std::slice::from_ref(self))
    }
}

// Iterative so that very deep plans don't overflow the stack on drop
impl Drop for PlanNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Prints whole row counts without a fractional part
pub(crate) fn format_rows(rows: f64) -> String {
    if rows.fract() == 0.0 && rows.abs() < 1e15 {
        format!("{}", rows as i64)
    } else {
        format!("{rows:.1}")
    }
}

/// Iterator for traversing plan nodes depth-first
pub struct PlanNodeIterator<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> PlanNodeIterator<'a> {
    /// Creates an iterator over a forest, visiting roots in order
    pub fn new(roots: &'a [PlanNode]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for PlanNodeIterator<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children in reverse order so we visit them in order
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
