//! Tests for diagnostic issues

use super::*;

fn issue_with(severity: Severity) -> Issue {
    let node = PlanNode::from_operation(0, "Table scan on users");
    Issue::new(
        IssueType::FullTableScan,
        severity,
        &node,
        "Full table scan",
        "Reads every row",
        "Add an index",
    )
}

mod severity_tests {
    use super::*;

    #[test]
    fn test_is_critical() {
        assert!(Severity::Critical.is_critical());
        assert!(!Severity::Warning.is_critical());
        assert!(!Severity::Info.is_critical());
    }

    #[test]
    fn test_is_warning_or_above() {
        assert!(Severity::Critical.is_warning_or_above());
        assert!(Severity::Warning.is_warning_or_above());
        assert!(!Severity::Info.is_warning_or_above());
    }

    #[test]
    fn test_ordering_is_most_severe_first() {
        assert!(Severity::Critical < Severity::Warning);
        assert!(Severity::Warning < Severity::Info);

        let mut severities = vec![Severity::Info, Severity::Critical, Severity::Warning];
        severities.sort();
        assert_eq!(severities, Severity::ALL.to_vec());
    }

    #[test]
    fn test_labels_and_emoji() {
        assert_eq!(Severity::Critical.as_str(), "critical");
        assert_eq!(Severity::Warning.label(), "WARNING");
        assert_eq!(Severity::Critical.emoji(), "🔴");
        assert_eq!(Severity::Warning.emoji(), "⚠️");
        assert_eq!(Severity::Info.emoji(), "ℹ️");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");

        let parsed: Severity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Severity::Critical);
    }
}

mod issue_tests {
    use super::*;

    #[test]
    fn test_creation_captures_node() {
        let issue = issue_with(Severity::Critical);

        assert_eq!(issue.issue_type, IssueType::FullTableScan);
        assert_eq!(issue.operation, "Table scan on users");
        assert_eq!(issue.table.as_deref(), Some("users"));
        assert_eq!(issue.node_path, NodePath::default());
        assert_eq!(issue.severity_emoji(), "🔴");
    }

    #[test]
    fn test_at_sets_path() {
        let issue = issue_with(Severity::Info).at(NodePath::root(0).child(2));
        assert_eq!(issue.node_path.indices(), &[0, 2]);
    }

    #[test]
    fn test_issue_type_serialization() {
        let json = serde_json::to_string(&IssueType::RowEstimationError).unwrap();
        assert_eq!(json, "\"row_estimation_error\"");
        assert!(IssueType::FullTableScan.description().contains("table scan"));
    }
}

mod health_tests {
    use super::*;

    #[test]
    fn test_good_when_empty() {
        assert_eq!(HealthStatus::from_issues(&Vec::<Issue>::new()), HealthStatus::Good);
        assert!(HealthStatus::Good.is_good());
    }

    #[test]
    fn test_worst_severity_wins() {
        let issues = vec![
            issue_with(Severity::Info),
            issue_with(Severity::Critical),
            issue_with(Severity::Warning),
        ];
        assert_eq!(HealthStatus::from_issues(&issues), HealthStatus::Critical);

        let issues = vec![issue_with(Severity::Info), issue_with(Severity::Warning)];
        assert_eq!(HealthStatus::from_issues(&issues), HealthStatus::Warning);

        let issues = vec![issue_with(Severity::Info)];
        assert_eq!(
            HealthStatus::from_issues(&issues),
            HealthStatus::NeedsAttention
        );
    }

    #[test]
    fn test_as_str_matches_serialization() {
        for status in [
            HealthStatus::Good,
            HealthStatus::NeedsAttention,
            HealthStatus::Warning,
            HealthStatus::Critical,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
