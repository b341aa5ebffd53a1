//! Tests for analysis results

use super::*;
use crate::issue::IssueType;
use crate::plan::NodePath;

fn issue(severity: Severity, title: &str) -> Issue {
    let node = PlanNode::from_operation(0, "Table scan on users");
    Issue::new(
        IssueType::FullTableScan,
        severity,
        &node,
        title,
        "message",
        "suggestion",
    )
    .at(NodePath::root(0))
}

fn plan() -> Vec<PlanNode> {
    vec![
        PlanNode::from_operation(0, "Limit: 10 row(s)")
            .with_actual(7.5, 7.91, 10, 1)
            .with_child(
                PlanNode::from_operation(4, "Table scan on users").with_actual(0.1, 7.4, 100, 1),
            ),
    ]
}

mod summary_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_total_time_uses_first_root() {
        let result = AnalysisResult::new(plan(), Vec::new());
        assert_eq!(result.total_time(), 7.91);
    }

    #[test]
    fn test_total_time_defaults_to_zero() {
        let result = AnalysisResult::new(vec![PlanNode::from_operation(0, "Stream results")], Vec::new());
        assert_eq!(result.total_time(), 0.0);
        assert_eq!(AnalysisResult::empty().total_time(), 0.0);
    }

    #[test]
    fn test_health_status_priority() {
        let good = AnalysisResult::new(plan(), Vec::new());
        assert_eq!(good.health_status(), HealthStatus::Good);
        assert!(!good.has_issues());

        let info = AnalysisResult::new(plan(), vec![issue(Severity::Info, "i")]);
        assert_eq!(info.health_status(), HealthStatus::NeedsAttention);

        let warning = AnalysisResult::new(
            plan(),
            vec![issue(Severity::Info, "i"), issue(Severity::Warning, "w")],
        );
        assert_eq!(warning.health_status(), HealthStatus::Warning);
        assert!(!warning.has_critical_issues());

        let critical = AnalysisResult::new(
            plan(),
            vec![issue(Severity::Warning, "w"), issue(Severity::Critical, "c")],
        );
        assert_eq!(critical.health_status(), HealthStatus::Critical);
        assert!(critical.has_critical_issues());
    }

    #[test]
    fn test_empty_result() {
        let result = AnalysisResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.node_count(), 0);
        assert_eq!(result.health_status(), HealthStatus::Good);
    }
}

mod issue_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_issues_by_severity_is_stable() {
        let result = AnalysisResult::new(
            plan(),
            vec![
                issue(Severity::Info, "info-1"),
                issue(Severity::Warning, "warning-1"),
                issue(Severity::Critical, "critical-1"),
                issue(Severity::Warning, "warning-2"),
                issue(Severity::Critical, "critical-2"),
            ],
        );

        let titles: Vec<_> = result
            .issues_by_severity()
            .into_iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["critical-1", "critical-2", "warning-1", "warning-2", "info-1"]
        );
        // The stored order is untouched
        assert_eq!(result.issues[0].title, "info-1");
    }

    #[test]
    fn test_counts() {
        let result = AnalysisResult::new(
            plan(),
            vec![issue(Severity::Warning, "a"), issue(Severity::Warning, "b")],
        );

        assert_eq!(result.node_count(), 2);
        assert_eq!(result.iter_nodes().count(), 2);
        assert_eq!(result.count_by_severity(Severity::Warning), 2);
        assert_eq!(result.count_by_severity(Severity::Critical), 0);
    }

    #[test]
    fn test_source_node() {
        let result = AnalysisResult::new(plan(), Vec::new());
        let node = PlanNode::from_operation(4, "Table scan on users");
        let child_issue = Issue::new(
            IssueType::FullTableScan,
            Severity::Critical,
            &node,
            "t",
            "m",
            "s",
        )
        .at(NodePath::root(0).child(0));

        let source = result.source_node(&child_issue).expect("resolves");
        assert_eq!(source.table_name.as_deref(), Some("users"));
        assert_eq!(source.actual_time_end, Some(7.4));

        let dangling = child_issue.clone().at(NodePath::root(3));
        assert!(result.source_node(&dangling).is_none());
    }
}

mod export_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_json() {
        let result = AnalysisResult::new(plan(), vec![issue(Severity::Critical, "scan")]);
        let value = result.to_json().expect("export");

        assert_eq!(value["total_time_ms"], 7.91);
        assert_eq!(value["node_count"], 2);
        assert_eq!(value["health_status"], "critical");
        assert_eq!(value["issue_counts"]["critical"], 1);
        assert_eq!(value["issues"][0]["issue_type"], "full_table_scan");
        assert_eq!(value["roots"][0]["children"][0]["table_name"], "users");
    }
}
