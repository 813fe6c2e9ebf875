//! Table output formatting for CLI commands
//!
//! Renders service health and run history as terminal tables using
//! comfy-table, with color-coded tiers and an icon fallback for
//! terminals without color support.

use crate::domain::models::{
    HealthReport, HealthTier, RunRecord, RunStatus, ServiceHealth, SessionStatus,
};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Render a full health report: verdict banner, per-service table,
    /// and numbered recommendations.
    pub fn format_report(&self, report: &HealthReport) -> String {
        let mut out = format!(
            "Pipeline health: {}  (generated {})\n\n",
            report.verdict.as_str().to_uppercase(),
            report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        );

        if report.services.is_empty() {
            out.push_str("No services configured. Add them under `services:` in .warden/config.yaml.\n");
            return out;
        }

        out.push_str(&self.format_services(&report.services));

        if !report.recommendations.is_empty() {
            out.push_str("\n\nRecommendations:\n");
            for (index, recommendation) in report.recommendations.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", index + 1, recommendation));
            }
        }

        out
    }

    /// Format per-service health as a table
    pub fn format_services(&self, services: &[ServiceHealth]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Service").add_attribute(Attribute::Bold),
            Cell::new("Session").add_attribute(Attribute::Bold),
            Cell::new("Score").add_attribute(Attribute::Bold),
            Cell::new("Tier").add_attribute(Attribute::Bold),
            Cell::new("Expires").add_attribute(Attribute::Bold),
            Cell::new("Issues").add_attribute(Attribute::Bold),
        ]);

        for service in services {
            let session_label = if service.blocked_on_human {
                format!("{} (blocked)", service.session_status.as_str())
            } else {
                service.session_status.as_str().to_string()
            };
            let session_cell = if self.use_colors {
                Cell::new(&session_label).fg(session_color(service.session_status))
            } else {
                Cell::new(&session_label)
            };

            let tier_cell = if self.use_colors {
                Cell::new(service.tier.as_str()).fg(tier_color(service.tier))
            } else {
                Cell::new(format!("{} {}", tier_icon(service.tier), service.tier))
            };

            let expires = service
                .expires_at
                .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string());

            table.add_row(vec![
                Cell::new(&service.service_id),
                session_cell,
                Cell::new(service.score.to_string()),
                tier_cell,
                Cell::new(&expires),
                Cell::new(summarize_issues(service)),
            ]);
        }

        table.to_string()
    }

    /// Format run history as a table
    pub fn format_runs(&self, runs: &[RunRecord]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Run").add_attribute(Attribute::Bold),
            Cell::new("Started").add_attribute(Attribute::Bold),
            Cell::new("Duration").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Attempted").add_attribute(Attribute::Bold),
            Cell::new("Failed").add_attribute(Attribute::Bold),
            Cell::new("Stage failures").add_attribute(Attribute::Bold),
        ]);

        for run in runs {
            let id_short = &run.id.to_string()[..8];

            let duration = run.finished_at.map_or_else(
                || "-".to_string(),
                |finished| {
                    let secs = (finished - run.started_at).num_seconds().max(0);
                    format!("{secs}s")
                },
            );

            let status_cell = if self.use_colors {
                Cell::new(run.status.as_str()).fg(run_status_color(run.status))
            } else {
                Cell::new(format!("{} {}", run_status_icon(run.status), run.status.as_str()))
            };

            table.add_row(vec![
                Cell::new(id_short),
                Cell::new(run.started_at.format("%Y-%m-%d %H:%M").to_string()),
                Cell::new(&duration),
                status_cell,
                Cell::new(run.services_attempted.to_string()),
                Cell::new(run.renewal_failures.to_string()),
                Cell::new(run.stage_failures.to_string()),
            ]);
        }

        table.to_string()
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width as u16);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

/// One-cell summary of a service's issue list
fn summarize_issues(service: &ServiceHealth) -> String {
    match service.issues.as_slice() {
        [] => "-".to_string(),
        [only] => truncate_text(&only.message, 48),
        [first, rest @ ..] => format!(
            "{} (+{} more)",
            truncate_text(&first.message, 36),
            rest.len()
        ),
    }
}

const fn tier_color(tier: HealthTier) -> Color {
    match tier {
        HealthTier::Healthy => Color::Green,
        HealthTier::Degraded => Color::Yellow,
        HealthTier::Critical => Color::Red,
    }
}

const fn tier_icon(tier: HealthTier) -> &'static str {
    match tier {
        HealthTier::Healthy => "✓",
        HealthTier::Degraded => "!",
        HealthTier::Critical => "✗",
    }
}

const fn session_color(status: SessionStatus) -> Color {
    match status {
        SessionStatus::Fresh => Color::Green,
        SessionStatus::Expiring => Color::Yellow,
        SessionStatus::Expired => Color::Red,
        SessionStatus::Unknown => Color::DarkGrey,
    }
}

const fn run_status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::Completed => Color::Green,
        RunStatus::Running => Color::Cyan,
        RunStatus::Aborted => Color::Red,
    }
}

const fn run_status_icon(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Completed => "✓",
        RunStatus::Running => "⟳",
        RunStatus::Aborted => "✗",
    }
}

/// Truncate text to max length with ellipsis, respecting char boundaries
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
