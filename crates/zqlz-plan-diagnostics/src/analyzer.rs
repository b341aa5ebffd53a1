//! Plan Analyzer - parse, diagnose and render in one call
//!
//! [`PlanAnalyzer`] ties the parser, the rule registry and the renderers
//! together. It is configured once through consuming builders and holds no
//! mutable state afterwards, so a single instance can be shared across
//! threads.

use crate::analysis::AnalysisResult;
use crate::error::{DiagnosticsError, Result};
use crate::parser::parse_plan;
use crate::render::{CompactFormatter, Explainer};
use crate::rules::{DiagnosticConfig, RuleRegistry};

/// Entry point for diagnosing profiled plans
#[derive(Debug, Clone)]
pub struct PlanAnalyzer {
    config: DiagnosticConfig,
    registry: RuleRegistry,
    explainer: Explainer,
}

impl Default for PlanAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanAnalyzer {
    /// Creates an analyzer with the default rules and markdown output
    pub fn new() -> Self {
        let config = DiagnosticConfig::default();
        Self {
            registry: RuleRegistry::with_defaults(&config),
            config,
            explainer: Explainer::new(),
        }
    }

    /// Same as [`PlanAnalyzer::new`]
    pub fn create() -> Self {
        Self::new()
    }

    /// Renders reports as plain text instead of markdown
    pub fn without_markdown(mut self) -> Self {
        self.explainer = self.explainer.without_markdown();
        self
    }

    /// Replaces the configuration and rebuilds the built-in rules from it
    pub fn with_config(mut self, config: DiagnosticConfig) -> Self {
        self.registry = RuleRegistry::with_defaults(&config);
        self.config = config;
        self
    }

    /// Replaces the rule set entirely
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &DiagnosticConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Parses and diagnoses plan text.
    ///
    /// Never fails: input without plan lines gives [`AnalysisResult::empty`].
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let roots = parse_plan(text);
        if roots.is_empty() {
            tracing::debug!("no plan lines found");
            return AnalysisResult::empty();
        }

        let issues = self.registry.diagnose(&roots);
        let result = AnalysisResult::new(roots, issues);
        tracing::debug!(
            nodes = result.node_count(),
            issues = result.issues.len(),
            health = result.health_status().as_str(),
            "plan analyzed"
        );
        result
    }

    /// Like [`PlanAnalyzer::analyze`], but reports blank input as an error
    pub fn try_analyze(&self, text: &str) -> Result<AnalysisResult> {
        let result = self.analyze(text);
        if result.is_empty() {
            return Err(DiagnosticsError::EmptyPlan);
        }
        Ok(result)
    }

    /// Analyzes and renders the full report
    pub fn explain(&self, text: &str) -> String {
        self.explainer.render(&self.analyze(text))
    }

    /// Analyzes and renders the compact digest
    pub fn explain_compact(&self, text: &str) -> String {
        CompactFormatter::new().format(&self.analyze(text))
    }
}
