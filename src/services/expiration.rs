//! Credential expiration classification.
//!
//! Pure functions over timestamps and per-service thresholds. Status is
//! never stored authoritatively; it is always recomputed from the record
//! and the definition at evaluation time.

use chrono::{DateTime, Utc};

use crate::domain::models::{ServiceDefinition, SessionRecord, SessionStatus};

/// Maps credential age to a status and the next renewal instant.
#[derive(Debug, Clone, Default)]
pub struct ExpirationPolicy;

impl ExpirationPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Classify a credential against its service thresholds at `now`.
    ///
    /// `unknown` without a record; `expired` at or past the hard
    /// lifetime; `expiring` once remaining life drops to the renewal
    /// interval; `fresh` otherwise.
    pub fn classify(
        &self,
        record: Option<&SessionRecord>,
        definition: &ServiceDefinition,
        now: DateTime<Utc>,
    ) -> SessionStatus {
        let Some(record) = record else {
            return SessionStatus::Unknown;
        };

        let expires = record.last_renewal_at + definition.max_age();
        let threshold = expires - definition.renewal_interval();

        if now >= expires {
            SessionStatus::Expired
        } else if now >= threshold {
            SessionStatus::Expiring
        } else {
            SessionStatus::Fresh
        }
    }

    /// The instant renewal becomes due: the expiring-threshold crossing.
    ///
    /// Used to avoid redundant attempts within one run. `None` without a
    /// record (renewal is due immediately for unknown services).
    pub fn next_action_time(
        &self,
        record: Option<&SessionRecord>,
        definition: &ServiceDefinition,
    ) -> Option<DateTime<Utc>> {
        record.map(|r| {
            r.last_renewal_at + definition.max_age() - definition.renewal_interval()
        })
    }

    /// Hard expiry instant. `None` without a record.
    pub fn expires_at(
        &self,
        record: Option<&SessionRecord>,
        definition: &ServiceDefinition,
    ) -> Option<DateTime<Utc>> {
        record.map(|r| r.expires_at(definition))
    }

    /// Whether the orchestrator should attempt renewal at `now`.
    pub fn renewal_due(
        &self,
        record: Option<&SessionRecord>,
        definition: &ServiceDefinition,
        now: DateTime<Utc>,
    ) -> bool {
        match self.classify(record, definition, now) {
            SessionStatus::Fresh => false,
            SessionStatus::Expiring | SessionStatus::Expired | SessionStatus::Unknown => true,
        }
    }
}
