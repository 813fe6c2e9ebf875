//! Shared command wiring.
//!
//! Builds every layer (database, stores, strategies, orchestrator,
//! notifications, report store) once per invocation from a loaded
//! configuration. `init` is the only command that runs without one.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::{AbortHandle, PipelineRunner, RefreshOrchestrator};
use crate::domain::models::WardenConfig;
use crate::domain::ports::{RunRecorder, SessionStore};
use crate::infrastructure::database::{DatabaseConnection, SqliteRunRecorder, SqliteSessionStore};
use crate::infrastructure::notify::NotificationDispatcher;
use crate::infrastructure::report::ReportStore;
use crate::infrastructure::strategies::build_strategy_map;

/// Fully wired application services for one CLI invocation.
pub struct AppContext {
    pub config: WardenConfig,
    pub runner: PipelineRunner,
    db: DatabaseConnection,
}

impl AppContext {
    /// Wire every layer from a loaded configuration.
    pub async fn build(config: WardenConfig) -> Result<Self> {
        let database_url = format!("sqlite:{}?mode=rwc", config.database.path);
        let db = DatabaseConnection::new(&database_url, config.database.max_connections)
            .await
            .with_context(|| {
                format!(
                    "failed to open database at {}; run `warden init` first",
                    config.database.path
                )
            })?;
        db.migrate().await?;

        let store: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::new(db.pool().clone()));
        let recorder: Arc<dyn RunRecorder> = Arc::new(SqliteRunRecorder::new(db.pool().clone()));

        let strategies = build_strategy_map(&config.services, &config.orchestrator)?;
        let orchestrator =
            RefreshOrchestrator::new(Arc::clone(&store), strategies, config.orchestrator.clone());

        let dispatcher = NotificationDispatcher::from_config(&config.notifications)?;
        let reports = ReportStore::new(&config.pipeline);

        let runner = PipelineRunner::new(
            config.clone(),
            store,
            recorder,
            orchestrator,
            dispatcher,
            reports,
        );

        Ok(Self { config, runner, db })
    }

    /// Close the connection pool gracefully.
    pub async fn shutdown(self) {
        self.db.close().await;
    }
}

/// Turn Ctrl-C into a pass abort instead of killing the process, so
/// in-flight attempts settle and the run record is closed out.
pub fn watch_interrupts(handle: AbortHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; aborting after in-flight attempts settle");
            handle.abort();
        }
    });
}
