//! `SQLite` implementation of the session store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::utils::parse_datetime;
use crate::domain::errors::{WardenError, WardenResult};
use crate::domain::models::{SessionRecord, SessionStatus};
use crate::domain::ports::SessionStore;

/// `SQLite`-backed [`SessionStore`].
///
/// One row per service in `sessions`; advisory leases live in
/// `session_locks` with a TTL so a crashed run never wedges a service.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    service_id: String,
    created_at: String,
    last_renewal_at: String,
    payload: String,
    status: String,
    failure_count: i64,
    blocked_reason: Option<String>,
    blocked_since: Option<String>,
    updated_at: String,
}

impl TryFrom<SessionRow> for SessionRecord {
    type Error = WardenError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status = SessionStatus::from_str(&row.status).ok_or_else(|| {
            WardenError::Serialization(format!("unknown session status: {}", row.status))
        })?;

        Ok(Self {
            service_id: row.service_id,
            created_at: parse_datetime(&row.created_at)
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
            last_renewal_at: parse_datetime(&row.last_renewal_at)
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
            payload: row.payload,
            status,
            failure_count: row.failure_count.max(0) as u32,
            blocked_reason: row.blocked_reason,
            blocked_since: row
                .blocked_since
                .as_deref()
                .map(parse_datetime)
                .transpose()
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
            updated_at: parse_datetime(&row.updated_at)
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, service_id: &str) -> WardenResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT service_id, created_at, last_renewal_at, payload, status,
                   failure_count, blocked_reason, blocked_since, updated_at
            FROM sessions
            WHERE service_id = ?
            ",
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRecord::try_from).transpose()
    }

    async fn list(&self) -> WardenResult<Vec<SessionRecord>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT service_id, created_at, last_renewal_at, payload, status,
                   failure_count, blocked_reason, blocked_since, updated_at
            FROM sessions
            ORDER BY service_id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SessionRecord::try_from).collect()
    }

    async fn put(&self, record: &SessionRecord) -> WardenResult<()> {
        sqlx::query(
            r"
            INSERT INTO sessions (
                service_id, created_at, last_renewal_at, payload, status,
                failure_count, blocked_reason, blocked_since, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(service_id) DO UPDATE SET
                created_at = excluded.created_at,
                last_renewal_at = excluded.last_renewal_at,
                payload = excluded.payload,
                status = excluded.status,
                failure_count = excluded.failure_count,
                blocked_reason = excluded.blocked_reason,
                blocked_since = excluded.blocked_since,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&record.service_id)
        .bind(record.created_at.to_rfc3339())
        .bind(record.last_renewal_at.to_rfc3339())
        .bind(&record.payload)
        .bind(record.status.as_str())
        .bind(i64::from(record.failure_count))
        .bind(&record.blocked_reason)
        .bind(record.blocked_since.map(|dt| dt.to_rfc3339()))
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_failure(&self, service_id: &str, now: DateTime<Utc>) -> WardenResult<u32> {
        let result = sqlx::query(
            r"
            UPDATE sessions
            SET failure_count = failure_count + 1, updated_at = ?
            WHERE service_id = ?
            ",
        )
        .bind(now.to_rfc3339())
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        // Failures against a never-authenticated service have nothing to
        // count against.
        if result.rows_affected() == 0 {
            return Ok(0);
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT failure_count FROM sessions WHERE service_id = ?")
                .bind(service_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u32)
    }

    async fn mark_blocked(
        &self,
        service_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> WardenResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE sessions
            SET blocked_reason = ?,
                blocked_since = COALESCE(blocked_since, ?),
                updated_at = ?
            WHERE service_id = ?
            ",
        )
        .bind(reason)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(service_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_lock(
        &self,
        service_id: &str,
        holder: Uuid,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> WardenResult<bool> {
        // Clear an expired lease before contending for the row.
        sqlx::query("DELETE FROM session_locks WHERE service_id = ? AND expires_at <= ?")
            .bind(service_id)
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            INSERT OR IGNORE INTO session_locks (service_id, holder, acquired_at, expires_at)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(service_id)
        .bind(holder.to_string())
        .bind(now.to_rfc3339())
        .bind((now + ttl).to_rfc3339())
        .execute(&self.pool)
        .await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT holder FROM session_locks WHERE service_id = ?")
                .bind(service_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some_and(|(h,)| h == holder.to_string()))
    }

    async fn unlock(&self, service_id: &str, holder: Uuid) -> WardenResult<()> {
        sqlx::query("DELETE FROM session_locks WHERE service_id = ? AND holder = ?")
            .bind(service_id)
            .bind(holder.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
