//! Full human-readable report

use super::{format_duration, health_emoji};
use crate::analysis::AnalysisResult;
use crate::issue::{Issue, Severity};
use crate::plan::{PlanNode, format_rows};

/// Renders an [`AnalysisResult`] as a structured report.
///
/// Markdown mode uses headings and bold labels; plain mode carries the same
/// information in the same order without markdown punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explainer {
    markdown: bool,
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Explainer {
    /// Creates an explainer producing markdown
    pub fn new() -> Self {
        Self { markdown: true }
    }

    /// Switches to plain text output
    pub fn without_markdown(self) -> Self {
        self.with_markdown(false)
    }

    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn is_markdown(&self) -> bool {
        self.markdown
    }

    /// Renders the full report
    pub fn render(&self, result: &AnalysisResult) -> String {
        let mut out = String::new();
        out.push_str(&self.heading(1, "Query Plan Analysis"));

        if result.is_empty() {
            out.push_str(&self.heading(2, "Summary"));
            out.push_str("No plan data to analyze.\n");
            return out;
        }

        self.render_summary(&mut out, result);
        self.render_plan(&mut out, result);
        self.render_issues(&mut out, result);
        out
    }

    fn render_summary(&self, out: &mut String, result: &AnalysisResult) {
        let health = result.health_status();
        let counts: Vec<String> = Severity::ALL
            .iter()
            .map(|s| format!("{} {}", result.count_by_severity(*s), s.as_str()))
            .collect();

        out.push_str(&self.heading(2, "Summary"));
        out.push_str(&self.field("Total time", &format_duration(result.total_time())));
        out.push_str(&self.field("Nodes", &result.node_count().to_string()));
        out.push_str(&self.field(
            "Issues",
            &format!("{} ({})", result.issues.len(), counts.join(", ")),
        ));
        out.push_str(&self.field(
            "Health",
            &format!("{} {}", health_emoji(health), health.as_str()),
        ));
        out.push('\n');
    }

    fn render_plan(&self, out: &mut String, result: &AnalysisResult) {
        out.push_str(&self.heading(2, "Execution Plan"));
        if self.markdown {
            out.push_str("```text\n");
        }

        let mut path: Vec<usize> = Vec::new();
        // (node, tree level, index among its siblings)
        let mut stack: Vec<(&PlanNode, usize, usize)> = result
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, root)| (root, 0, i))
            .collect();

        while let Some((node, level, index)) = stack.pop() {
            path.truncate(level);
            path.push(index);
            self.render_node(out, result, node, &path);

            stack.extend(
                node.children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, child)| (child, level + 1, i)),
            );
        }

        if self.markdown {
            out.push_str("```\n");
        }
        out.push('\n');
    }

    fn render_node(
        &self,
        out: &mut String,
        result: &AnalysisResult,
        node: &PlanNode,
        path: &[usize],
    ) {
        let level = path.len().saturating_sub(1);
        let indent = "  ".repeat(level + usize::from(!self.markdown));
        out.push_str(&format!("{indent}-> {}", node.operation_text));

        if let Some(stats) = node_stats(node) {
            out.push_str(&format!("  [{stats}]"));
        }
        let worst = result
            .issues
            .iter()
            .filter(|issue| issue.node_path.indices() == path)
            .map(|issue| issue.severity)
            .min();
        if let Some(severity) = worst {
            out.push_str(&format!("  {}", severity.emoji()));
        }
        out.push('\n');
    }

    fn render_issues(&self, out: &mut String, result: &AnalysisResult) {
        out.push_str(&self.heading(2, "Issues"));
        if !result.has_issues() {
            out.push_str("No issues detected. The plan looks healthy.\n");
            return;
        }

        for (number, issue) in result.issues_by_severity().into_iter().enumerate() {
            self.render_issue(out, number + 1, issue);
        }
    }

    fn render_issue(&self, out: &mut String, number: usize, issue: &Issue) {
        let title = format!("{number}. {} {}", issue.severity_emoji(), issue.title);
        if self.markdown {
            out.push_str(&format!("#### {title}\n\n"));
            out.push_str(&format!("**Severity:** {}\n\n", issue.severity.label()));
            out.push_str(&format!("{}\n\n", issue.message));
            out.push_str(&format!("**Suggestion:** {}\n\n", issue.suggestion));
        } else {
            out.push_str(&format!("{title}\n"));
            out.push_str(&format!("   Severity: {}\n", issue.severity.label()));
            out.push_str(&format!("   {}\n", issue.message));
            out.push_str(&format!("   Suggestion: {}\n\n", issue.suggestion));
        }
    }

    fn heading(&self, level: usize, text: &str) -> String {
        match (self.markdown, level) {
            (true, _) => format!("{} {text}\n\n", "#".repeat(level + 1)),
            (false, 1) => format!("{}\n\n", text.to_uppercase()),
            (false, _) => format!("{text}\n"),
        }
    }

    fn field(&self, label: &str, value: &str) -> String {
        if self.markdown {
            format!("- **{label}:** {value}\n")
        } else {
            format!("  {label}: {value}\n")
        }
    }
}

/// Short statistics suffix for a plan line
fn node_stats(node: &PlanNode) -> Option<String> {
    let mut parts = Vec::new();

    if let (Some(start), Some(end)) = (node.actual_time_start, node.actual_time_end) {
        parts.push(format!("{start:.2}..{end:.2} ms"));
    }
    match (node.actual_rows, node.estimated_rows) {
        (Some(actual), Some(estimated)) => {
            parts.push(format!("{actual} rows (est. {})", format_rows(estimated)))
        }
        (Some(actual), None) => parts.push(format!("{actual} rows")),
        (None, Some(estimated)) => parts.push(format!("est. {} rows", format_rows(estimated))),
        (None, None) => {}
    }
    if let Some(loops) = node.loops.filter(|l| *l > 1) {
        parts.push(format!("{loops} loops"));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
