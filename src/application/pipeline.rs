//! Full control-loop runs.
//!
//! [`PipelineRunner`] sequences one `run-pipeline` invocation: refresh
//! pass, extractor hand-off, freshness inspection, health scoring,
//! notifications, report persistence, and the run-history record. It
//! also backs the read-only `check-status` path and single-service
//! refreshes.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::orchestrator::{AbortHandle, RefreshOptions, RefreshOrchestrator};
use crate::domain::errors::{WardenError, WardenResult};
use crate::domain::models::{
    HealthReport, IssueKind, OutcomeKind, RunRecord, ServiceDefinition, ServiceOutcome,
    SessionRecord, WardenConfig,
};
use crate::domain::ports::{RunRecorder, SessionStore};
use crate::infrastructure::notify::NotificationDispatcher;
use crate::infrastructure::report::ReportStore;
use crate::services::{ExpirationPolicy, HealthScorer, ZoneFreshnessInspector};

/// Flags for one `run-pipeline` invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Skip the extractor hand-off entirely.
    pub skip_extractors: bool,
    /// Re-run the extractor once for services whose stages scored stale
    /// while their session is still usable.
    pub auto_remediate: bool,
}

/// Sequences a full control-loop run.
pub struct PipelineRunner {
    config: WardenConfig,
    store: Arc<dyn SessionStore>,
    recorder: Arc<dyn RunRecorder>,
    orchestrator: RefreshOrchestrator,
    dispatcher: NotificationDispatcher,
    reports: ReportStore,
    inspector: ZoneFreshnessInspector,
    scorer: HealthScorer,
    policy: ExpirationPolicy,
}

impl PipelineRunner {
    pub fn new(
        config: WardenConfig,
        store: Arc<dyn SessionStore>,
        recorder: Arc<dyn RunRecorder>,
        orchestrator: RefreshOrchestrator,
        dispatcher: NotificationDispatcher,
        reports: ReportStore,
    ) -> Self {
        let inspector = ZoneFreshnessInspector::new(config.pipeline.clone());
        let scorer = HealthScorer::new(config.scoring.clone(), config.orchestrator.retry_bound);

        Self {
            config,
            store,
            recorder,
            orchestrator,
            dispatcher,
            reports,
            inspector,
            scorer,
            policy: ExpirationPolicy::new(),
        }
    }

    /// Handle for wiring run-level abort to Ctrl-C.
    pub fn abort_handle(&self) -> AbortHandle {
        self.orchestrator.abort_handle()
    }

    /// Classification, freshness, and scoring without touching any
    /// state. With `service` set, the report covers that service alone.
    pub async fn check_status(&self, service: Option<&str>) -> WardenResult<HealthReport> {
        let services: Vec<ServiceDefinition> = match service {
            Some(id) => {
                let definition = self
                    .config
                    .service(id)
                    .ok_or_else(|| WardenError::ServiceNotFound(id.to_string()))?;
                vec![definition.clone()]
            }
            None => self.config.services.clone(),
        };

        let records = self.session_map().await?;
        let now = Utc::now();
        let snapshot = self.inspector.inspect(&services, now);

        Ok(self
            .scorer
            .build_report(Uuid::new_v4(), &services, &records, &snapshot, now))
    }

    /// Recent run records, newest first.
    pub async fn recent_runs(&self, limit: u32) -> WardenResult<Vec<RunRecord>> {
        self.recorder.recent_runs(limit).await
    }

    /// Refresh one named service under its own run record.
    pub async fn refresh_service(
        &self,
        service_id: &str,
        force: bool,
    ) -> WardenResult<ServiceOutcome> {
        let service = self
            .config
            .service(service_id)
            .ok_or_else(|| WardenError::ServiceNotFound(service_id.to_string()))?
            .clone();

        let mut run = RunRecord::start(Utc::now());
        self.recorder.start_run(&run).await?;
        info!(run_id = %run.id, service = %service.id, force, "single-service refresh started");

        let outcome = self.orchestrator.refresh_one(&service, run.id, force).await;
        self.recorder.record_outcome(run.id, &outcome).await?;
        run.absorb_outcomes(std::slice::from_ref(&outcome));

        let finished = Utc::now();
        if outcome.outcome == OutcomeKind::Cancelled {
            run.abort(finished);
        } else {
            run.complete(finished);
        }
        self.recorder.complete_run(&run).await?;

        Ok(outcome)
    }

    /// One full control-loop run.
    pub async fn run(&self, options: PipelineOptions) -> Result<HealthReport> {
        let mut run = RunRecord::start(Utc::now());
        self.recorder
            .start_run(&run)
            .await
            .context("failed to open run record")?;
        info!(
            run_id = %run.id,
            services = self.config.services.len(),
            "pipeline run started"
        );

        let pass = self
            .orchestrator
            .refresh_all(&self.config.services, run.id, RefreshOptions::default())
            .await;
        for outcome in &pass.outcomes {
            debug!(
                service = %outcome.service_id,
                outcome = %outcome.outcome.as_str(),
                "renewal outcome recorded"
            );
            self.recorder
                .record_outcome(run.id, outcome)
                .await
                .context("failed to record service outcome")?;
        }
        run.absorb_outcomes(&pass.outcomes);

        if pass.aborted {
            info!(run_id = %run.id, "run aborted during refresh, skipping hand-off");
        } else if options.skip_extractors {
            info!("extractor hand-off skipped by flag");
        } else {
            let targets = self.usable_services(None).await?;
            let failures = self.run_extractors(&targets).await;
            for outcome in &failures {
                self.recorder
                    .record_outcome(run.id, outcome)
                    .await
                    .context("failed to record extractor outcome")?;
            }
            run.absorb_outcomes(&failures);
        }

        let now = Utc::now();
        let snapshot = self.inspector.inspect(&self.config.services, now);
        let records = self.session_map().await?;
        let mut report =
            self.scorer
                .build_report(run.id, &self.config.services, &records, &snapshot, now);
        for service in &report.services {
            debug!(
                service = %service.service_id,
                score = service.score,
                tier = %service.tier.as_str(),
                "service scored"
            );
        }

        if options.auto_remediate && !options.skip_extractors && !pass.aborted {
            let stale: Vec<String> = report
                .services
                .iter()
                .filter(|s| {
                    s.session_status.is_usable()
                        && s.issues.iter().any(|i| i.kind == IssueKind::StaleStage)
                })
                .map(|s| s.service_id.clone())
                .collect();

            if !stale.is_empty() {
                info!(services = stale.len(), "re-running extractors for stale stages");
                let targets = self.usable_services(Some(&stale)).await?;
                let failures = self.run_extractors(&targets).await;
                for outcome in &failures {
                    self.recorder
                        .record_outcome(run.id, outcome)
                        .await
                        .context("failed to record remediation outcome")?;
                }
                run.absorb_outcomes(&failures);

                let now = Utc::now();
                let snapshot = self.inspector.inspect(&self.config.services, now);
                let records = self.session_map().await?;
                report = self.scorer.build_report(
                    run.id,
                    &self.config.services,
                    &records,
                    &snapshot,
                    now,
                );
            }
        }

        // The previous snapshot must be read before save overwrites it.
        let previous = self.reports.load_previous();
        let alerts =
            NotificationDispatcher::diff_reports(previous.as_ref(), &report, Utc::now());
        run.notification_failures = self.dispatcher.dispatch(&alerts).await;

        if let Err(err) = self.reports.save(&report) {
            warn!(error = %err, "failed to persist health report");
        }

        let finished = Utc::now();
        if pass.aborted {
            run.abort(finished);
        } else {
            run.complete(finished);
        }
        self.recorder
            .complete_run(&run)
            .await
            .context("failed to finalize run record")?;

        info!(
            run_id = %run.id,
            verdict = %report.verdict,
            attempted = run.services_attempted,
            renewal_failures = run.renewal_failures,
            stage_failures = run.stage_failures,
            "pipeline run finished"
        );

        Ok(report)
    }

    /// Services whose session can back an extractor run, with their
    /// records, in priority order. `only` narrows to named ids.
    async fn usable_services(
        &self,
        only: Option<&[String]>,
    ) -> WardenResult<Vec<(ServiceDefinition, SessionRecord)>> {
        let mut targets = Vec::new();
        let now = Utc::now();

        for service in &self.config.services {
            if service.extractor_command.is_empty() {
                continue;
            }
            if let Some(ids) = only {
                if !ids.contains(&service.id) {
                    continue;
                }
            }

            let record = self.store.get(&service.id).await?;
            let status = self.policy.classify(record.as_ref(), service, now);
            if !status.is_usable() {
                debug!(service = %service.id, status = %status.as_str(), "session not usable, extractor skipped");
                continue;
            }
            if let Some(record) = record {
                targets.push((service.clone(), record));
            }
        }

        targets.sort_by_key(|(service, _)| service.priority.rank());
        Ok(targets)
    }

    /// Run extractors sequentially; returns an outcome row per failure.
    async fn run_extractors(
        &self,
        targets: &[(ServiceDefinition, SessionRecord)],
    ) -> Vec<ServiceOutcome> {
        let mut failures = Vec::new();

        for (service, record) in targets {
            match self.run_extractor(service, record).await {
                Ok(()) => {
                    info!(service = %service.id, "extractor completed");
                }
                Err(detail) => {
                    warn!(service = %service.id, %detail, "extractor failed");
                    failures.push(
                        ServiceOutcome::new(service.id.clone(), OutcomeKind::ExtractorFailed)
                            .with_detail(detail),
                    );
                }
            }
        }

        failures
    }

    /// Run one configured extractor command with the session payload on
    /// stdin and a hard timeout.
    async fn run_extractor(
        &self,
        service: &ServiceDefinition,
        record: &SessionRecord,
    ) -> std::result::Result<(), String> {
        let Some((program, args)) = service.extractor_command.split_first() else {
            return Ok(());
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .env("WARDEN_SERVICE", &service.id)
            .env("WARDEN_PIPELINE_ROOT", &self.config.pipeline.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(service = %service.id, program = %program, "spawning extractor");
        let mut child = command
            .spawn()
            .map_err(|err| format!("failed to spawn extractor: {err}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(record.payload.as_bytes()).await {
                return Err(format!("failed to hand session to extractor: {err}"));
            }
            drop(stdin);
        }

        let limit = Duration::from_secs(self.config.pipeline.extractor_timeout_secs);
        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(format!(
                "extractor exited with {}: {}",
                output.status,
                trim_output(&output.stderr)
            )),
            Ok(Err(err)) => Err(format!("failed to wait for extractor: {err}")),
            // The dropped child is killed on drop.
            Err(_) => Err(format!(
                "extractor timed out after {}s",
                self.config.pipeline.extractor_timeout_secs
            )),
        }
    }

    async fn session_map(&self) -> WardenResult<HashMap<String, SessionRecord>> {
        let records = self.store.list().await?;
        Ok(records
            .into_iter()
            .map(|record| (record.service_id.clone(), record))
            .collect())
    }
}

fn trim_output(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    let cut = text
        .char_indices()
        .nth(400)
        .map_or(text.len(), |(index, _)| index);
    if cut < text.len() {
        format!("{}...", &text[..cut])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RefreshErrorKind;
    use crate::domain::models::{
        AuthMechanism, HealthAlert, HealthTier, OrchestratorConfig, PipelineConfig,
        PriorityClass, RunStatus,
    };
    use crate::domain::ports::{
        NotificationChannel, RefreshOutcome, RefreshStrategy,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn definition(id: &str, extractor: Vec<&str>) -> ServiceDefinition {
        ServiceDefinition {
            id: id.to_string(),
            mechanism: AuthMechanism::SilentExchange,
            max_age_days: 30,
            renewal_interval_days: 7,
            interactive: false,
            priority: PriorityClass::Medium,
            stale_after_days: 7,
            helper_command: vec![],
            extractor_command: extractor.into_iter().map(String::from).collect(),
            file_hints: vec![],
            token_endpoint: None,
        }
    }

    struct StubStore {
        records: Mutex<HashMap<String, SessionRecord>>,
    }

    impl StubStore {
        fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
            }
        }

        fn with_record(record: SessionRecord) -> Self {
            let store = Self::new();
            store
                .records
                .lock()
                .unwrap()
                .insert(record.service_id.clone(), record);
            store
        }
    }

    #[async_trait]
    impl SessionStore for StubStore {
        async fn get(&self, service_id: &str) -> WardenResult<Option<SessionRecord>> {
            Ok(self.records.lock().unwrap().get(service_id).cloned())
        }

        async fn list(&self) -> WardenResult<Vec<SessionRecord>> {
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }

        async fn put(&self, record: &SessionRecord) -> WardenResult<()> {
            self.records
                .lock()
                .unwrap()
                .insert(record.service_id.clone(), record.clone());
            Ok(())
        }

        async fn record_failure(
            &self,
            service_id: &str,
            now: DateTime<Utc>,
        ) -> WardenResult<u32> {
            let mut records = self.records.lock().unwrap();
            match records.get_mut(service_id) {
                Some(record) => {
                    record.failure_count += 1;
                    record.updated_at = now;
                    Ok(record.failure_count)
                }
                None => Ok(0),
            }
        }

        async fn mark_blocked(
            &self,
            service_id: &str,
            reason: &str,
            now: DateTime<Utc>,
        ) -> WardenResult<bool> {
            let mut records = self.records.lock().unwrap();
            match records.get_mut(service_id) {
                Some(record) => {
                    record.blocked_reason = Some(reason.to_string());
                    record.blocked_since.get_or_insert(now);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn try_lock(
            &self,
            _service_id: &str,
            _holder: Uuid,
            _ttl: chrono::Duration,
            _now: DateTime<Utc>,
        ) -> WardenResult<bool> {
            Ok(true)
        }

        async fn unlock(&self, _service_id: &str, _holder: Uuid) -> WardenResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubRecorder {
        runs: Mutex<Vec<RunRecord>>,
        outcomes: Mutex<Vec<(Uuid, ServiceOutcome)>>,
    }

    impl StubRecorder {
        fn completed_run(&self) -> Option<RunRecord> {
            self.runs
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.status != RunStatus::Running)
                .cloned()
        }

        fn outcome_kinds(&self) -> Vec<OutcomeKind> {
            self.outcomes
                .lock()
                .unwrap()
                .iter()
                .map(|(_, o)| o.outcome)
                .collect()
        }
    }

    #[async_trait]
    impl RunRecorder for StubRecorder {
        async fn start_run(&self, run: &RunRecord) -> WardenResult<()> {
            self.runs.lock().unwrap().push(run.clone());
            Ok(())
        }

        async fn record_outcome(
            &self,
            run_id: Uuid,
            outcome: &ServiceOutcome,
        ) -> WardenResult<()> {
            self.outcomes.lock().unwrap().push((run_id, outcome.clone()));
            Ok(())
        }

        async fn complete_run(&self, run: &RunRecord) -> WardenResult<()> {
            let mut runs = self.runs.lock().unwrap();
            if let Some(slot) = runs.iter_mut().find(|r| r.id == run.id) {
                *slot = run.clone();
            }
            Ok(())
        }

        async fn recent_runs(&self, limit: u32) -> WardenResult<Vec<RunRecord>> {
            let runs = self.runs.lock().unwrap();
            Ok(runs.iter().rev().take(limit as usize).cloned().collect())
        }

        async fn outcomes_for_run(&self, run_id: Uuid) -> WardenResult<Vec<ServiceOutcome>> {
            let outcomes = self.outcomes.lock().unwrap();
            Ok(outcomes
                .iter()
                .filter(|(id, _)| *id == run_id)
                .map(|(_, o)| o.clone())
                .collect())
        }
    }

    struct FixedStrategy {
        outcome: RefreshOutcome,
    }

    #[async_trait]
    impl RefreshStrategy for FixedStrategy {
        fn mechanism(&self) -> AuthMechanism {
            AuthMechanism::SilentExchange
        }

        async fn attempt(
            &self,
            _service: &ServiceDefinition,
            _existing: Option<&SessionRecord>,
        ) -> RefreshOutcome {
            self.outcome.clone()
        }
    }

    struct CapturingChannel {
        alerts: Arc<Mutex<Vec<HealthAlert>>>,
    }

    #[async_trait]
    impl NotificationChannel for CapturingChannel {
        fn name(&self) -> &str {
            "capture"
        }

        async fn deliver(&self, alert: &HealthAlert) -> WardenResult<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    struct Fixture {
        runner: PipelineRunner,
        store: Arc<StubStore>,
        recorder: Arc<StubRecorder>,
        alerts: Arc<Mutex<Vec<HealthAlert>>>,
        _reports_dir: TempDir,
    }

    fn fixture(
        services: Vec<ServiceDefinition>,
        store: StubStore,
        outcome: RefreshOutcome,
    ) -> Fixture {
        let reports_dir = TempDir::new().expect("tempdir");
        let config = WardenConfig {
            pipeline: PipelineConfig {
                root: reports_dir.path().join("lake").to_string_lossy().into_owned(),
                extractor_timeout_secs: 5,
                ..PipelineConfig::default()
            },
            orchestrator: OrchestratorConfig {
                retry_initial_backoff_ms: 1,
                retry_max_backoff_ms: 2,
                ..OrchestratorConfig::default()
            },
            services,
            ..WardenConfig::default()
        };

        let store = Arc::new(store);
        let recorder = Arc::new(StubRecorder::default());
        let alerts = Arc::new(Mutex::new(Vec::new()));

        let mut strategies: HashMap<String, Arc<dyn RefreshStrategy>> = HashMap::new();
        for service in &config.services {
            strategies.insert(
                service.id.clone(),
                Arc::new(FixedStrategy {
                    outcome: outcome.clone(),
                }),
            );
        }

        let store_port: Arc<dyn SessionStore> = store.clone();
        let orchestrator = RefreshOrchestrator::new(
            Arc::clone(&store_port),
            strategies,
            config.orchestrator.clone(),
        );
        let channel: Arc<dyn NotificationChannel> = Arc::new(CapturingChannel {
            alerts: Arc::clone(&alerts),
        });
        let dispatcher = NotificationDispatcher::new(vec![channel]);
        let reports = ReportStore::at(
            reports_dir.path().join("report.json"),
            reports_dir.path().join("report.txt"),
        );

        let recorder_port: Arc<dyn RunRecorder> = recorder.clone();
        let runner = PipelineRunner::new(
            config,
            store_port,
            recorder_port,
            orchestrator,
            dispatcher,
            reports,
        );

        Fixture {
            runner,
            store,
            recorder,
            alerts,
            _reports_dir: reports_dir,
        }
    }

    #[tokio::test]
    async fn test_empty_registry_completes_cleanly() {
        let f = fixture(
            vec![],
            StubStore::new(),
            RefreshOutcome::failed(RefreshErrorKind::Network, "unused"),
        );

        let report = f
            .runner
            .run(PipelineOptions::default())
            .await
            .expect("run succeeds");

        assert!(report.services.is_empty());
        assert_eq!(report.verdict, HealthTier::Healthy);
        let run = f.recorder.completed_run().expect("run finalized");
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.services_attempted, 0);
    }

    #[tokio::test]
    async fn test_renewal_and_extractor_flow() {
        let f = fixture(
            vec![definition("svc", vec!["sh", "-c", "exit 0"])],
            StubStore::new(),
            RefreshOutcome::Renewed {
                payload: "fresh-token".to_string(),
            },
        );

        let report = f
            .runner
            .run(PipelineOptions::default())
            .await
            .expect("run succeeds");

        assert_eq!(report.services.len(), 1);
        let kinds = f.recorder.outcome_kinds();
        assert_eq!(kinds, vec![OutcomeKind::Renewed], "no extractor failure rows");

        let run = f.recorder.completed_run().expect("run finalized");
        assert_eq!(run.services_attempted, 1);
        assert_eq!(run.stage_failures, 0);
        assert_eq!(
            f.store
                .records
                .lock()
                .unwrap()
                .get("svc")
                .expect("record written")
                .payload,
            "fresh-token"
        );
    }

    #[tokio::test]
    async fn test_extractor_failure_is_recorded() {
        let f = fixture(
            vec![definition("svc", vec!["sh", "-c", "echo broken >&2; exit 3"])],
            StubStore::new(),
            RefreshOutcome::Renewed {
                payload: "token".to_string(),
            },
        );

        f.runner
            .run(PipelineOptions::default())
            .await
            .expect("run succeeds");

        let kinds = f.recorder.outcome_kinds();
        assert!(kinds.contains(&OutcomeKind::ExtractorFailed));
        let run = f.recorder.completed_run().expect("run finalized");
        assert_eq!(run.stage_failures, 1);

        let outcomes = f.recorder.outcomes.lock().unwrap();
        let extractor = outcomes
            .iter()
            .find(|(_, o)| o.outcome == OutcomeKind::ExtractorFailed)
            .expect("extractor outcome");
        assert!(
            extractor.1.detail.as_deref().unwrap_or_default().contains("broken"),
            "stderr lands in the detail"
        );
    }

    #[tokio::test]
    async fn test_skip_extractors_flag() {
        let f = fixture(
            vec![definition("svc", vec!["sh", "-c", "exit 3"])],
            StubStore::new(),
            RefreshOutcome::Renewed {
                payload: "token".to_string(),
            },
        );

        f.runner
            .run(PipelineOptions {
                skip_extractors: true,
                auto_remediate: false,
            })
            .await
            .expect("run succeeds");

        assert!(
            !f.recorder.outcome_kinds().contains(&OutcomeKind::ExtractorFailed),
            "failing extractor never ran"
        );
    }

    #[tokio::test]
    async fn test_unusable_session_skips_extractor() {
        let expired_at = Utc::now() - chrono::Duration::days(90);
        let store = StubStore::with_record(SessionRecord::new(
            "svc".to_string(),
            "ancient".to_string(),
            expired_at,
        ));
        // Renewal keeps failing, so the session stays expired.
        let f = fixture(
            vec![definition("svc", vec!["sh", "-c", "exit 3"])],
            store,
            RefreshOutcome::failed(RefreshErrorKind::InvalidCredential, "revoked"),
        );

        f.runner
            .run(PipelineOptions::default())
            .await
            .expect("run succeeds");

        let kinds = f.recorder.outcome_kinds();
        assert!(kinds.contains(&OutcomeKind::Failed));
        assert!(
            !kinds.contains(&OutcomeKind::ExtractorFailed),
            "no extractor run on an expired session"
        );
    }

    #[tokio::test]
    async fn test_first_run_report_is_persisted_and_quiet() {
        let f = fixture(
            vec![definition("svc", vec![])],
            StubStore::new(),
            RefreshOutcome::failed(RefreshErrorKind::Network, "down"),
        );

        let report = f
            .runner
            .run(PipelineOptions::default())
            .await
            .expect("run succeeds");

        assert_ne!(report.verdict, HealthTier::Healthy, "unknown session penalized");
        assert!(
            f.alerts.lock().unwrap().is_empty(),
            "first run alerts only on blocked-on-human"
        );
        // A second run sees the persisted snapshot and stays quiet when
        // nothing degraded further.
        f.runner
            .run(PipelineOptions::default())
            .await
            .expect("second run succeeds");
        assert!(f.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_status_rejects_unknown_service() {
        let f = fixture(
            vec![definition("svc", vec![])],
            StubStore::new(),
            RefreshOutcome::failed(RefreshErrorKind::Network, "unused"),
        );

        let err = f
            .runner
            .check_status(Some("missing"))
            .await
            .expect_err("unknown service");
        assert!(matches!(err, WardenError::ServiceNotFound(_)));
    }

    #[tokio::test]
    async fn test_check_status_writes_nothing() {
        let f = fixture(
            vec![definition("svc", vec![])],
            StubStore::new(),
            RefreshOutcome::Renewed {
                payload: "never-used".to_string(),
            },
        );

        let report = f.runner.check_status(None).await.expect("status");

        assert_eq!(report.services.len(), 1);
        assert!(f.recorder.runs.lock().unwrap().is_empty(), "read-only path");
        assert!(f.store.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_service_records_a_run() {
        let f = fixture(
            vec![definition("svc", vec![])],
            StubStore::new(),
            RefreshOutcome::Renewed {
                payload: "token".to_string(),
            },
        );

        let outcome = f
            .runner
            .refresh_service("svc", false)
            .await
            .expect("refresh succeeds");

        assert_eq!(outcome.outcome, OutcomeKind::Renewed);
        let run = f.recorder.completed_run().expect("run finalized");
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.services_attempted, 1);
    }

    #[test]
    fn test_trim_output_caps_length() {
        let long = "x".repeat(1000);
        let trimmed = trim_output(long.as_bytes());
        assert!(trimmed.len() <= 404);
        assert!(trimmed.ends_with("..."));
        assert_eq!(trim_output(b"  short  \n"), "short");
    }
}
