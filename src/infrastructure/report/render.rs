//! Plain-text report rendering.
//!
//! Produces the human-readable twin of the JSON report, written next to
//! it on every pipeline run so an operator can `cat` the current state
//! without tooling.

use crate::domain::models::{HealthReport, ServiceHealth};

/// Render the full report as plain text.
pub fn render_report(report: &HealthReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Pipeline health: {} (run {})\n",
        report.verdict, report.run_id
    ));
    out.push_str(&format!(
        "Generated: {}\n\n",
        report.generated_at.to_rfc3339()
    ));

    for service in &report.services {
        out.push_str(&render_service(service));
    }

    if !report.recommendations.is_empty() {
        out.push_str("\nRecommendations:\n");
        for (index, recommendation) in report.recommendations.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", index + 1, recommendation));
        }
    }

    out
}

fn render_service(service: &ServiceHealth) -> String {
    let mut out = String::new();

    let blocked = if service.blocked_on_human {
        "  BLOCKED ON HUMAN"
    } else {
        ""
    };
    out.push_str(&format!(
        "  [{:<8}] {:<20} score {:>3}  {}{}\n",
        service.tier.as_str(),
        service.service_id,
        service.score,
        service.session_status.as_str(),
        blocked
    ));

    if let Some(expires_at) = service.expires_at {
        out.push_str(&format!(
            "      session expires {}\n",
            expires_at.to_rfc3339()
        ));
    }

    for issue in &service.issues {
        out.push_str(&format!("      - {}\n", issue.message));
    }

    out
}
