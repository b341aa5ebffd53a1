//! Report renderers
//!
//! - [`Explainer`]: full report with summary, plan tree and issues, in
//!   markdown or plain text
//! - [`CompactFormatter`]: short digest whose first line fits inline

mod compact;
mod explainer;

pub use compact::CompactFormatter;
pub use explainer::Explainer;

use crate::issue::HealthStatus;

/// Formats a duration given in milliseconds
pub fn format_duration(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{:.2} ms", ms)
    }
}

/// Icon for an overall health status
pub fn health_emoji(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Good => "✅",
        HealthStatus::NeedsAttention => "ℹ️",
        HealthStatus::Warning => "⚠️",
        HealthStatus::Critical => "🔴",
    }
}

fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests;
