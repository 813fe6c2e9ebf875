//! Session store port.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::errors::WardenResult;
use crate::domain::models::SessionRecord;

/// Durable store for session credentials, one record per service.
///
/// Credential fields are written only through [`SessionStore::put`] after
/// a successful renewal. `record_failure` and `mark_blocked` touch only
/// bookkeeping columns and are no-ops for services that never
/// authenticated.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the record for one service, if any.
    async fn get(&self, service_id: &str) -> WardenResult<Option<SessionRecord>>;

    /// List all records.
    async fn list(&self) -> WardenResult<Vec<SessionRecord>>;

    /// Insert or overwrite the record for a service.
    async fn put(&self, record: &SessionRecord) -> WardenResult<()>;

    /// Bump the consecutive-failure counter, leaving credential fields
    /// untouched. Returns the new counter, or 0 when no record exists.
    async fn record_failure(&self, service_id: &str, now: DateTime<Utc>) -> WardenResult<u32>;

    /// Suspend automated renewal pending an operator step. Returns false
    /// when no record exists to mark.
    async fn mark_blocked(
        &self,
        service_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<bool>;

    /// Try to take the per-service advisory lease. Returns true when the
    /// lease was acquired (or already held by `holder`).
    async fn try_lock(
        &self,
        service_id: &str,
        holder: Uuid,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> WardenResult<bool>;

    /// Release the advisory lease if held by `holder`.
    async fn unlock(&self, service_id: &str, holder: Uuid) -> WardenResult<()>;
}
