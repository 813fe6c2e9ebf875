//! Health reports and alerts.
//!
//! A [`HealthReport`] is regenerated from current state on every run and
//! never cached; the persisted snapshot exists only so the next run can
//! detect tier degradations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::service::PriorityClass;
use super::session::SessionStatus;

/// Severity tier derived from a numeric health score.
///
/// Variant order is severity order, so `Ord::max` picks the worse tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    Healthy,
    Degraded,
    Critical,
}

impl HealthTier {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "healthy" => Some(Self::Healthy),
            "degraded" => Some(Self::Degraded),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// One-step demotion used when weighting low-priority services.
    pub const fn demoted(&self) -> Self {
        match self {
            Self::Critical => Self::Degraded,
            Self::Degraded | Self::Healthy => Self::Healthy,
        }
    }

    /// Process exit code the CLI maps this tier to.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Critical => 2,
        }
    }
}

impl std::fmt::Display for HealthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a reported health issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Session expired, expiring, or never established.
    Credential,
    /// A stage artifact is older than the service threshold.
    StaleStage,
    /// Data entered an earlier stage but did not propagate.
    StuckStage,
    /// Renewal kept failing beyond the retry bound.
    RepeatedFailure,
    /// Automated renewal suspended pending an operator step.
    BlockedOnHuman,
    /// A configured stage directory does not exist.
    MissingStage,
}

/// One scored problem on a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIssue {
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
    /// Score penalty this issue applied.
    pub penalty: u32,
}

impl HealthIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>, penalty: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            penalty,
        }
    }
}

/// Health assessment for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service_id: String,

    /// Verdict weighting class copied from the definition.
    pub priority: PriorityClass,

    /// Session classification at scoring time.
    pub session_status: SessionStatus,

    /// 0-100; starts at 100 and loses penalty points.
    pub score: u8,

    pub tier: HealthTier,

    /// Automated renewal is suspended pending an operator step.
    pub blocked_on_human: bool,

    pub issues: Vec<HealthIssue>,

    /// Hard expiry of the current credential, if a record exists.
    pub expires_at: Option<DateTime<Utc>>,

    /// When renewal becomes due, if a record exists.
    pub next_action_at: Option<DateTime<Utc>>,
}

/// Consolidated health report for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Run this report was generated for.
    pub run_id: Uuid,

    pub generated_at: DateTime<Utc>,

    pub services: Vec<ServiceHealth>,

    /// Worst weighted tier across services.
    pub verdict: HealthTier,

    /// Ordered remediation actions, most urgent first.
    pub recommendations: Vec<String>,
}

impl HealthReport {
    pub fn for_service(&self, service_id: &str) -> Option<&ServiceHealth> {
        self.services.iter().find(|s| s.service_id == service_id)
    }

    /// Exit code for the aggregate verdict.
    pub const fn exit_code(&self) -> u8 {
        self.verdict.exit_code()
    }
}

/// What triggered a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    /// Tier worsened versus the previous run.
    TierDegraded { from: HealthTier, to: HealthTier },
    /// The service entered blocked-on-human.
    BlockedOnHuman { reason: String },
}

/// Alert emitted when a service's condition worsens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub service_id: String,
    pub kind: AlertKind,
    /// Score at alert time.
    pub score: u8,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}
