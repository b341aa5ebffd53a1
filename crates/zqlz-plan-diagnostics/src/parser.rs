//! Profiled Plan Parser
//!
//! Parses the tree-shaped text printed by a profile-enabled EXPLAIN
//! (`EXPLAIN ANALYZE`). One operator per line, nesting by indentation,
//! optional trailing annotation groups:
//!
//! ```text
//! -> Limit: 10 row(s)  (cost=5.2 rows=10) (actual time=0.9..0.9 rows=10 loops=1)
//!     -> Filter: (u.active = 1)  (cost=5.2 rows=50) (actual time=0.1..0.8 rows=10 loops=1)
//!         -> Table scan on u  (cost=5.2 rows=500) (actual time=0.1..0.6 rows=90 loops=1)
//! ```
//!
//! Parsing never fails on a malformed line: whatever cannot be interpreted
//! is left unset and the line becomes an `Other` node.
//!
//! # Examples
//!
//! ```
//! use zqlz_plan_diagnostics::parser::parse_plan;
//! use zqlz_plan_diagnostics::plan::OperationKind;
//!
//! let roots = parse_plan("-> Table scan on users  (cost=5000 rows=50000)");
//! assert_eq!(roots.len(), 1);
//! assert_eq!(roots[0].operation_kind, OperationKind::TableScan);
//! assert_eq!(roots[0].estimated_rows, Some(50000.0));
//! ```

use crate::error::{DiagnosticsError, Result};
use crate::plan::{OperationKind, PlanNode};
use regex::Regex;
use std::sync::LazyLock;

const NUMBER: &str = r"[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?";

/// Marker preceding each operator
const NODE_MARKER: &str = "->";

/// Prefix MySQL prints in vertical (`\G`) output
const VERTICAL_PREFIX: &str = "EXPLAIN:";

static COST_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\(cost=({NUMBER})(?:\.\.({NUMBER}))?\s+rows=({NUMBER})[^)]*\)"
    ))
    .expect("valid regex")
});

static ACTUAL_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\(actual time=({NUMBER})\.\.({NUMBER})\s+rows=({NUMBER})\s+loops=({NUMBER})\)"
    ))
    .expect("valid regex")
});

static ANNOTATION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((?:cost=|actual time=|never executed\))").expect("valid regex")
});

/// Parses plan text into its root nodes, in the order they appear.
///
/// Blank lines are skipped. Empty input yields an empty list.
pub fn parse_plan(text: &str) -> Vec<PlanNode> {
    let mut roots: Vec<PlanNode> = Vec::new();
    let mut stack: Vec<(usize, PlanNode)> = Vec::new(); // (depth, node)
    let mut line_count = 0usize;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        line_count += 1;

        let node = parse_line(line);
        let depth = node.depth;

        // Close every open node that cannot be an ancestor of this line
        while stack.last().is_some_and(|(top, _)| *top >= depth) {
            if let Some((_, finished)) = stack.pop() {
                attach(&mut stack, &mut roots, finished);
            }
        }

        stack.push((depth, node));
    }

    while let Some((_, finished)) = stack.pop() {
        attach(&mut stack, &mut roots, finished);
    }

    tracing::debug!(lines = line_count, roots = roots.len(), "parsed plan text");
    roots
}

/// Parses plan text, reporting blank input as [`DiagnosticsError::EmptyPlan`]
pub fn try_parse_plan(text: &str) -> Result<Vec<PlanNode>> {
    let roots = parse_plan(text);
    if roots.is_empty() {
        return Err(DiagnosticsError::EmptyPlan);
    }
    Ok(roots)
}

/// Parses a single plan line into a childless node
pub fn parse_line(line: &str) -> PlanNode {
    let raw_text = line.trim_end_matches(['\r', '\n']);
    let depth = count_indent(raw_text);

    let mut content = raw_text.trim_start();
    if let Some(rest) = content.strip_prefix(VERTICAL_PREFIX) {
        content = rest.trim_start();
    }
    let content = content
        .strip_prefix(NODE_MARKER)
        .unwrap_or(content)
        .trim();

    let operation_text = match ANNOTATION_START.find(content) {
        Some(m) => content[..m.start()].trim_end(),
        None => content,
    };

    let mut node = PlanNode::new(depth, raw_text, operation_text);
    parse_annotations(&mut node, content);

    if node.operation_kind == OperationKind::Other {
        tracing::trace!(line = %raw_text, "unrecognized plan operation");
    }

    node
}

/// Extracts the cost and actual groups; each one is optional on its own
fn parse_annotations(node: &mut PlanNode, content: &str) {
    if let Some(caps) = COST_GROUP.captures(content) {
        // With a "startup..total" range the total is the cost of the node
        let cost = caps.get(2).or_else(|| caps.get(1));
        node.estimated_cost = cost.and_then(|m| m.as_str().parse::<f64>().ok());
        node.estimated_rows = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok());
    }

    if let Some(caps) = ACTUAL_GROUP.captures(content) {
        node.actual_time_start = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        node.actual_time_end = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
        node.actual_rows = caps.get(3).and_then(|m| parse_count(m.as_str()));
        node.loops = caps.get(4).and_then(|m| parse_count(m.as_str()));
    }
}

/// Row and loop counts may be printed as averages ("rows=0.5")
fn parse_count(s: &str) -> Option<u64> {
    let value = s.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value.round() as u64)
    } else {
        None
    }
}

fn attach(stack: &mut [(usize, PlanNode)], roots: &mut Vec<PlanNode>, node: PlanNode) {
    if let Some((_, parent)) = stack.last_mut() {
        parent.children.push(node);
    } else {
        roots.push(node);
    }
}

/// Helper to count leading whitespace characters (indentation)
fn count_indent(s: &str) -> usize {
    s.chars().take_while(|c| c.is_whitespace()).count()
}
