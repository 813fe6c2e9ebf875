//! Run recorder port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::WardenResult;
use crate::domain::models::{RunRecord, ServiceOutcome};

/// Append-only history of control-loop invocations.
#[async_trait]
pub trait RunRecorder: Send + Sync {
    /// Append a new run row at start.
    async fn start_run(&self, run: &RunRecord) -> WardenResult<()>;

    /// Append one service outcome under a run.
    async fn record_outcome(&self, run_id: Uuid, outcome: &ServiceOutcome) -> WardenResult<()>;

    /// Finalize a run row with its end state and counters.
    async fn complete_run(&self, run: &RunRecord) -> WardenResult<()>;

    /// Most recent runs, newest first.
    async fn recent_runs(&self, limit: u32) -> WardenResult<Vec<RunRecord>>;

    /// Outcomes recorded under one run, in record order.
    async fn outcomes_for_run(&self, run_id: Uuid) -> WardenResult<Vec<ServiceOutcome>>;
}
