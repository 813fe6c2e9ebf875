//! Session credential records.
//!
//! One [`SessionRecord`] exists per external service once it has
//! authenticated successfully. Credential fields (payload and renewal
//! timestamps) change only on a successful renewal; the failure counter
//! and blocked markers are orchestrator bookkeeping and never touch the
//! credential itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::ServiceDefinition;

/// Freshness classification of a stored session credential.
///
/// Always derived from timestamps and thresholds, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Inside the renewal threshold; no action needed.
    Fresh,
    /// Renewal threshold crossed but not hard-expired.
    Expiring,
    /// Past the hard credential lifetime.
    Expired,
    /// No record exists for the service.
    Unknown,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Expiring => "expiring",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fresh" => Some(Self::Fresh),
            "expiring" => Some(Self::Expiring),
            "expired" => Some(Self::Expired),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Whether the credential can still back an extractor run.
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Fresh | Self::Expiring)
    }
}

/// One stored credential per external service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Owning service id.
    pub service_id: String,

    /// First successful authentication.
    pub created_at: DateTime<Utc>,

    /// Most recent successful renewal; equals `created_at` until the
    /// first renewal.
    pub last_renewal_at: DateTime<Utc>,

    /// Opaque provider-issued credential payload. Stored and returned,
    /// never inspected.
    pub payload: String,

    /// Classification cached at the last evaluation.
    pub status: SessionStatus,

    /// Consecutive failed renewal attempts since the last success.
    pub failure_count: u32,

    /// Set while automated renewal is suspended pending an operator step.
    pub blocked_reason: Option<String>,

    /// When the suspension began.
    pub blocked_since: Option<DateTime<Utc>>,

    /// Last time any column of this record changed.
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a record for a first successful authentication.
    pub fn new(service_id: String, payload: String, now: DateTime<Utc>) -> Self {
        Self {
            service_id,
            created_at: now,
            last_renewal_at: now,
            payload,
            status: SessionStatus::Fresh,
            failure_count: 0,
            blocked_reason: None,
            blocked_since: None,
            updated_at: now,
        }
    }

    /// Hard expiry instant for the given service definition.
    pub fn expires_at(&self, definition: &ServiceDefinition) -> DateTime<Utc> {
        self.last_renewal_at + definition.max_age()
    }

    /// Whether automated renewal is suspended pending an operator step.
    pub fn is_blocked(&self) -> bool {
        self.blocked_reason.is_some()
    }

    /// Applies a successful renewal: overwrites the payload, advances the
    /// renewal timestamp, and clears failure and blocked bookkeeping.
    pub fn renewed(&mut self, payload: String, now: DateTime<Utc>) {
        self.payload = payload;
        self.last_renewal_at = now;
        self.status = SessionStatus::Fresh;
        self.failure_count = 0;
        self.blocked_reason = None;
        self.blocked_since = None;
        self.updated_at = now;
    }
}
