//! Tests for report rendering

use super::*;
use crate::analysis::AnalysisResult;
use crate::issue::{Issue, IssueType, Severity};
use crate::plan::{NodePath, PlanNode};

fn scan_node() -> PlanNode {
    PlanNode::from_operation(4, "Table scan on users")
        .with_estimate(5000.0, 50000.0)
        .with_actual(0.1, 100.0, 50000, 1)
}

fn plan() -> Vec<PlanNode> {
    vec![
        PlanNode::from_operation(0, "Limit: 10 row(s)")
            .with_actual(100.2, 100.3, 10, 1)
            .with_child(scan_node()),
    ]
}

fn scan_issue() -> Issue {
    Issue::new(
        IssueType::FullTableScan,
        Severity::Critical,
        &scan_node(),
        "Full table scan",
        "Full table scan on 'users'",
        "Add an index on 'users'",
    )
    .at(NodePath::root(0).child(0))
}

fn note(title: &str) -> Issue {
    Issue::new(
        IssueType::HighLoopCount,
        Severity::Info,
        &scan_node(),
        title,
        "executed many times",
        "index the join column",
    )
    .at(NodePath::root(0))
}

mod helper_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(7.91), "7.91 ms");
        assert_eq!(format_duration(0.0), "0.00 ms");
        assert_eq!(format_duration(1250.0), "1.25 s");
    }

    #[test]
    fn test_health_emoji() {
        assert_eq!(health_emoji(HealthStatus::Good), "✅");
        assert_eq!(health_emoji(HealthStatus::Critical), "🔴");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "node", "nodes"), "1 node");
        assert_eq!(pluralize(0, "node", "nodes"), "0 nodes");
        assert_eq!(pluralize(3, "warning", "warnings"), "3 warnings");
    }
}

mod explainer_tests {
    use super::*;

    #[test]
    fn test_markdown_sections() {
        let result = AnalysisResult::new(plan(), vec![scan_issue()]);
        let report = Explainer::new().render(&result);

        assert!(report.starts_with("## Query Plan Analysis"));
        assert!(report.contains("### Summary"));
        assert!(report.contains("- **Total time:** 100.30 ms"));
        assert!(report.contains("- **Nodes:** 2"));
        assert!(report.contains("1 (1 critical, 0 warning, 0 info)"));
        assert!(report.contains("🔴 critical"));
        assert!(report.contains("### Execution Plan"));
        assert!(report.contains("```text"));
        assert!(report.contains("### Issues"));
        assert!(report.contains("#### 1. 🔴 Full table scan"));
        assert!(report.contains("**Severity:** CRITICAL"));
        assert!(report.contains("**Suggestion:** Add an index on 'users'"));
    }

    #[test]
    fn test_section_order() {
        let result = AnalysisResult::new(plan(), vec![scan_issue()]);
        let report = Explainer::new().render(&result);

        let summary = report.find("### Summary").expect("summary");
        let tree = report.find("### Execution Plan").expect("plan");
        let issues = report.find("### Issues").expect("issues");
        assert!(summary < tree && tree < issues);

        let plain = Explainer::new().without_markdown().render(&result);
        let summary = plain.find("\nSummary\n").expect("summary");
        let tree = plain.find("\nExecution Plan\n").expect("plan");
        let issues = plain.find("\nIssues\n").expect("issues");
        assert!(summary < tree && tree < issues);
    }

    #[test]
    fn test_deep_plan_tree() {
        const DEPTH: usize = 4_000;

        let mut chain = scan_node();
        for level in (0..DEPTH).rev() {
            chain = PlanNode::from_operation(level, "Nested loop inner join").with_child(chain);
        }
        let mut path = NodePath::root(0);
        for _ in 0..DEPTH {
            path = path.child(0);
        }
        let issue = scan_issue().at(path);
        let result = AnalysisResult::new(vec![chain], vec![issue]);

        let report = Explainer::new().render(&result);
        let last_line = report
            .lines()
            .rev()
            .find(|line| line.trim_start().starts_with("->"))
            .expect("plan lines");
        let expected = format!("{}-> Table scan on users", "  ".repeat(DEPTH));
        assert!(last_line.starts_with(&expected));
        assert!(last_line.ends_with("🔴"));
    }

    #[test]
    fn test_plan_tree_marks_offending_node() {
        let result = AnalysisResult::new(plan(), vec![scan_issue()]);
        let report = Explainer::new().render(&result);

        let scan_line = report
            .lines()
            .find(|line| line.contains("Table scan on users"))
            .expect("scan line");
        assert!(scan_line.starts_with("  -> "));
        assert!(scan_line.contains("50000 rows (est. 50000)"));
        assert!(scan_line.ends_with("🔴"));

        let limit_line = report
            .lines()
            .find(|line| line.contains("Limit: 10 row(s)"))
            .expect("limit line");
        assert!(limit_line.starts_with("-> "));
        assert!(!limit_line.contains("🔴"));
    }

    #[test]
    fn test_issues_in_severity_order() {
        let result = AnalysisResult::new(plan(), vec![note("Repeated execution"), scan_issue()]);
        let report = Explainer::new().render(&result);

        assert!(report.contains("#### 1. 🔴 Full table scan"));
        assert!(report.contains("#### 2. ℹ️ Repeated execution"));
    }

    #[test]
    fn test_plain_mode_has_no_markdown() {
        let result = AnalysisResult::new(plan(), vec![scan_issue()]);
        let explainer = Explainer::new().without_markdown();
        let report = explainer.render(&result);

        assert!(!explainer.is_markdown());
        assert!(report.starts_with("QUERY PLAN ANALYSIS"));
        assert!(report.contains("Summary"));
        assert!(report.contains("Total time: 100.30 ms"));
        assert!(report.contains("Severity: CRITICAL"));
        assert!(report.contains("Suggestion: Add an index on 'users'"));
        assert!(!report.contains('#'));
        assert!(!report.contains("**"));
        assert!(!report.contains('`'));
    }

    #[test]
    fn test_no_issues() {
        let result = AnalysisResult::new(plan(), Vec::new());
        let report = Explainer::new().render(&result);

        assert!(report.contains("No issues detected"));
        assert!(report.contains("✅ good"));
    }

    #[test]
    fn test_empty_result() {
        let report = Explainer::new().render(&AnalysisResult::empty());
        assert!(report.contains("No plan data"));

        let plain = Explainer::new()
            .without_markdown()
            .render(&AnalysisResult::empty());
        assert!(!plain.contains('#'));
    }
}

mod compact_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_healthy() {
        let result = AnalysisResult::new(plan(), Vec::new());
        assert_eq!(
            CompactFormatter::new().format(&result),
            "2 nodes · 100.30 ms · ✅ healthy"
        );
    }

    #[test]
    fn test_issue_lines() {
        let result = AnalysisResult::new(
            plan(),
            vec![note("Repeated execution"), scan_issue(), note("Large sort")],
        );
        let digest = CompactFormatter::new().format(&result);
        let lines: Vec<&str> = digest.lines().collect();

        assert_eq!(
            lines,
            vec![
                "2 nodes · 100.30 ms · 1 critical issue, 2 notes",
                "🔴 Full table scan",
                "ℹ️ Repeated execution",
                "ℹ️ Large sort",
            ]
        );
    }

    #[test]
    fn test_single_node() {
        let result = AnalysisResult::new(
            vec![PlanNode::from_operation(0, "Rows fetched before execution")],
            Vec::new(),
        );
        assert_eq!(
            CompactFormatter::new().format(&result),
            "1 node · 0.00 ms · ✅ healthy"
        );
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(
            CompactFormatter::new().format(&AnalysisResult::empty()),
            "No plan data"
        );
    }
}
