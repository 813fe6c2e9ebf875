//! Run history records.
//!
//! Every invocation that touches state appends one [`RunRecord`] plus a
//! [`ServiceOutcome`] row per processed service. History is append-only;
//! completed rows are never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one control-loop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}

/// Recorded result class for one service within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// A new credential was written.
    Renewed,
    /// Still fresh; no attempt made.
    Fresh,
    /// Not attempted: lock held elsewhere or renewal suspended.
    Skipped,
    /// All permitted attempts failed.
    Failed,
    /// The strategy demanded an operator step.
    BlockedOnHuman,
    /// Aborted mid-attempt; nothing was written.
    Cancelled,
    /// Session state could not be read or written for this service.
    StorageError,
    /// The post-refresh extractor hand-off failed.
    ExtractorFailed,
}

impl OutcomeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Renewed => "renewed",
            Self::Fresh => "fresh",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::BlockedOnHuman => "blocked_on_human",
            Self::Cancelled => "cancelled",
            Self::StorageError => "storage_error",
            Self::ExtractorFailed => "extractor_failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "renewed" => Some(Self::Renewed),
            "fresh" => Some(Self::Fresh),
            "skipped" => Some(Self::Skipped),
            "failed" => Some(Self::Failed),
            "blocked_on_human" => Some(Self::BlockedOnHuman),
            "cancelled" => Some(Self::Cancelled),
            "storage_error" => Some(Self::StorageError),
            "extractor_failed" => Some(Self::ExtractorFailed),
            _ => None,
        }
    }

    /// Whether a renewal attempt actually ran for this outcome.
    pub const fn attempted(&self) -> bool {
        matches!(
            self,
            Self::Renewed | Self::Failed | Self::BlockedOnHuman | Self::Cancelled
        )
    }

    /// Whether this outcome counts as a renewal failure.
    pub const fn is_renewal_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::StorageError)
    }
}

/// Recorded result of one service within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOutcome {
    pub service_id: String,
    pub outcome: OutcomeKind,
    /// Error kind, reason, or other detail where applicable.
    pub detail: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ServiceOutcome {
    pub fn new(service_id: impl Into<String>, outcome: OutcomeKind) -> Self {
        Self {
            service_id: service_id.into(),
            outcome,
            detail: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// One control-loop invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Services for which a renewal attempt ran.
    pub services_attempted: u32,
    /// Services whose renewal ultimately failed.
    pub renewal_failures: u32,
    /// Extractor hand-off failures.
    pub stage_failures: u32,
    /// Notification deliveries that failed.
    pub notification_failures: u32,
}

impl RunRecord {
    /// Starts a new run at `now`.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            finished_at: None,
            status: RunStatus::Running,
            services_attempted: 0,
            renewal_failures: 0,
            stage_failures: 0,
            notification_failures: 0,
        }
    }

    /// Marks the run completed at `now`.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = RunStatus::Completed;
        self.finished_at = Some(now);
    }

    /// Marks the run aborted at `now`.
    pub fn abort(&mut self, now: DateTime<Utc>) {
        self.status = RunStatus::Aborted;
        self.finished_at = Some(now);
    }

    /// Folds a batch of outcomes into the run counters.
    pub fn absorb_outcomes(&mut self, outcomes: &[ServiceOutcome]) {
        for outcome in outcomes {
            if outcome.outcome.attempted() {
                self.services_attempted += 1;
            }
            if outcome.outcome.is_renewal_failure() {
                self.renewal_failures += 1;
            }
            if outcome.outcome == OutcomeKind::ExtractorFailed {
                self.stage_failures += 1;
            }
        }
    }
}
