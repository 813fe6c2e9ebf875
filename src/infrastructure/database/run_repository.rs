//! `SQLite` implementation of the run recorder.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::utils::parse_datetime;
use crate::domain::errors::{WardenError, WardenResult};
use crate::domain::models::{OutcomeKind, RunRecord, RunStatus, ServiceOutcome};
use crate::domain::ports::RunRecorder;

/// `SQLite`-backed [`RunRecorder`].
///
/// `runs` gets one row per invocation, finalized exactly once through
/// `complete_run`; `run_services` holds the per-service outcomes.
pub struct SqliteRunRecorder {
    pool: SqlitePool,
}

impl SqliteRunRecorder {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RunRow {
    id: String,
    started_at: String,
    finished_at: Option<String>,
    status: String,
    services_attempted: i64,
    renewal_failures: i64,
    stage_failures: i64,
    notification_failures: i64,
}

impl TryFrom<RunRow> for RunRecord {
    type Error = WardenError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let status = RunStatus::from_str(&row.status).ok_or_else(|| {
            WardenError::Serialization(format!("unknown run status: {}", row.status))
        })?;

        Ok(Self {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
            started_at: parse_datetime(&row.started_at)
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
            finished_at: row
                .finished_at
                .as_deref()
                .map(parse_datetime)
                .transpose()
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
            status,
            services_attempted: row.services_attempted.max(0) as u32,
            renewal_failures: row.renewal_failures.max(0) as u32,
            stage_failures: row.stage_failures.max(0) as u32,
            notification_failures: row.notification_failures.max(0) as u32,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    service_id: String,
    outcome: String,
    detail: Option<String>,
    recorded_at: String,
}

impl TryFrom<OutcomeRow> for ServiceOutcome {
    type Error = WardenError;

    fn try_from(row: OutcomeRow) -> Result<Self, Self::Error> {
        let outcome = OutcomeKind::from_str(&row.outcome).ok_or_else(|| {
            WardenError::Serialization(format!("unknown outcome kind: {}", row.outcome))
        })?;

        Ok(Self {
            service_id: row.service_id,
            outcome,
            detail: row.detail,
            recorded_at: parse_datetime(&row.recorded_at)
                .map_err(|e| WardenError::Serialization(e.to_string()))?,
        })
    }
}

#[async_trait]
impl RunRecorder for SqliteRunRecorder {
    async fn start_run(&self, run: &RunRecord) -> WardenResult<()> {
        sqlx::query(
            r"
            INSERT INTO runs (
                id, started_at, finished_at, status,
                services_attempted, renewal_failures, stage_failures, notification_failures
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(run.id.to_string())
        .bind(run.started_at.to_rfc3339())
        .bind(run.finished_at.map(|dt| dt.to_rfc3339()))
        .bind(run.status.as_str())
        .bind(i64::from(run.services_attempted))
        .bind(i64::from(run.renewal_failures))
        .bind(i64::from(run.stage_failures))
        .bind(i64::from(run.notification_failures))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_outcome(&self, run_id: Uuid, outcome: &ServiceOutcome) -> WardenResult<()> {
        sqlx::query(
            r"
            INSERT INTO run_services (run_id, service_id, outcome, detail, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(run_id.to_string())
        .bind(&outcome.service_id)
        .bind(outcome.outcome.as_str())
        .bind(&outcome.detail)
        .bind(outcome.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn complete_run(&self, run: &RunRecord) -> WardenResult<()> {
        let result = sqlx::query(
            r"
            UPDATE runs
            SET finished_at = ?, status = ?,
                services_attempted = ?, renewal_failures = ?,
                stage_failures = ?, notification_failures = ?
            WHERE id = ? AND status = 'running'
            ",
        )
        .bind(run.finished_at.map(|dt| dt.to_rfc3339()))
        .bind(run.status.as_str())
        .bind(i64::from(run.services_attempted))
        .bind(i64::from(run.renewal_failures))
        .bind(i64::from(run.stage_failures))
        .bind(i64::from(run.notification_failures))
        .bind(run.id.to_string())
        .execute(&self.pool)
        .await?;

        // Finalizing twice or finalizing an unknown run is a logic error.
        if result.rows_affected() == 0 {
            return Err(WardenError::Storage(format!(
                "run {} is not open for completion",
                run.id
            )));
        }

        Ok(())
    }

    async fn recent_runs(&self, limit: u32) -> WardenResult<Vec<RunRecord>> {
        let rows = sqlx::query_as::<_, RunRow>(
            r"
            SELECT id, started_at, finished_at, status,
                   services_attempted, renewal_failures, stage_failures, notification_failures
            FROM runs
            ORDER BY started_at DESC
            LIMIT ?
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RunRecord::try_from).collect()
    }

    async fn outcomes_for_run(&self, run_id: Uuid) -> WardenResult<Vec<ServiceOutcome>> {
        let rows = sqlx::query_as::<_, OutcomeRow>(
            r"
            SELECT service_id, outcome, detail, recorded_at
            FROM run_services
            WHERE run_id = ?
            ORDER BY id ASC
            ",
        )
        .bind(run_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ServiceOutcome::try_from).collect()
    }
}
