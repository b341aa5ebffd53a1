//! ZQLZ Plan Diagnostics - Anti-pattern detection for profiled query plans
//!
//! This crate provides functionality for:
//! - Parsing the indented tree printed by `EXPLAIN ANALYZE`
//! - Running independent diagnostic rules over every plan node
//! - Classifying overall plan health from the issues found
//! - Rendering a full report (markdown or plain text) or a compact digest
//!
//! # Examples
//!
//! ```
//! use zqlz_plan_diagnostics::{HealthStatus, IssueType, PlanAnalyzer};
//!
//! let analyzer = PlanAnalyzer::create();
//! let result = analyzer.analyze(
//!     "-> Table scan on users  (cost=5000 rows=50000) (actual time=0.1..100 rows=50000 loops=1)",
//! );
//!
//! assert_eq!(result.health_status(), HealthStatus::Critical);
//! assert_eq!(result.issues[0].issue_type, IssueType::FullTableScan);
//! assert!(analyzer.explain_compact("").starts_with("No plan data"));
//! ```

pub mod analysis;
pub mod analyzer;
pub mod error;
pub mod issue;
pub mod parser;
pub mod plan;
pub mod render;
pub mod rules;

pub use analysis::AnalysisResult;
pub use analyzer::PlanAnalyzer;
pub use error::{DiagnosticsError, Result};
pub use issue::{HealthStatus, Issue, IssueType, Severity};
pub use parser::{parse_line, parse_plan, try_parse_plan};
pub use plan::{NodePath, OperationKind, PlanNode, PlanNodeIterator};
pub use render::{CompactFormatter, Explainer};
pub use rules::{DiagnosticConfig, DiagnosticRule, RuleRegistry};
