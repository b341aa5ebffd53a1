//! One-glance digest for inline display

use super::{format_duration, pluralize};
use crate::analysis::AnalysisResult;
use crate::issue::Severity;

/// Short digest of an [`AnalysisResult`].
///
/// The first line is `"<nodes> · <time> · <status>"`; each following line
/// names one issue, most severe first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactFormatter;

impl CompactFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, result: &AnalysisResult) -> String {
        if result.is_empty() {
            return "No plan data".to_string();
        }

        let mut out = format!(
            "{} · {} · {}",
            pluralize(result.node_count(), "node", "nodes"),
            format_duration(result.total_time()),
            status_phrase(result)
        );

        for issue in result.issues_by_severity() {
            out.push('\n');
            out.push_str(&format!("{} {}", issue.severity_emoji(), issue.title));
        }
        out
    }
}

/// Issue counts per severity, most severe first, or a healthy marker
fn status_phrase(result: &AnalysisResult) -> String {
    let parts: Vec<String> = Severity::ALL
        .iter()
        .map(|severity| (*severity, result.count_by_severity(*severity)))
        .filter(|(_, count)| *count > 0)
        .map(|(severity, count)| match severity {
            Severity::Critical => pluralize(count, "critical issue", "critical issues"),
            Severity::Warning => pluralize(count, "warning", "warnings"),
            Severity::Info => pluralize(count, "note", "notes"),
        })
        .collect();

    if parts.is_empty() {
        "✅ healthy".to_string()
    } else {
        parts.join(", ")
    }
}
