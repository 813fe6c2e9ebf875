//! Refresh orchestration.
//!
//! Drives renewal attempts across the service registry using tokio
//! concurrency primitives:
//! - Semaphore for bounding concurrent attempts
//! - broadcast channel for run-level abort
//! - JoinSet for attempt workers
//!
//! Services are processed in priority order. Any strategy outcome that
//! demands an operator step forces the remainder of the run serial, so
//! two interactive prompts never overlap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::models::{
    OrchestratorConfig, OutcomeKind, ServiceDefinition, ServiceOutcome, SessionRecord,
    SessionStatus,
};
use crate::domain::ports::{RefreshOutcome, RefreshStrategy, SessionStore};
use crate::services::ExpirationPolicy;

/// Per-invocation options for a refresh pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Attempt renewal even while the classification is still `fresh`.
    pub force: bool,
    /// Attempt services whose renewal is suspended pending an operator
    /// step. Set for operator-initiated single-service refreshes.
    pub attempt_blocked: bool,
}

/// Result of one refresh pass.
#[derive(Debug, Clone)]
pub struct RefreshPass {
    /// Per-service outcomes, one per scheduled service.
    pub outcomes: Vec<ServiceOutcome>,
    /// Whether the pass was cut short by an abort signal. Services not
    /// yet scheduled at that point have no outcome.
    pub aborted: bool,
}

/// Cloneable handle that aborts an in-progress refresh pass.
///
/// The flag covers aborts raised before a pass starts; the broadcast
/// wakes attempts already in flight.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
    tx: broadcast::Sender<()>,
}

impl AbortHandle {
    /// Request an abort. Idempotent.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Orchestrates renewal attempts for the service registry.
pub struct RefreshOrchestrator {
    store: Arc<dyn SessionStore>,
    strategies: HashMap<String, Arc<dyn RefreshStrategy>>,
    config: OrchestratorConfig,
    policy: ExpirationPolicy,
    abort_flag: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RefreshOrchestrator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        strategies: HashMap<String, Arc<dyn RefreshStrategy>>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            store,
            strategies,
            config,
            policy: ExpirationPolicy::new(),
            abort_flag: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Handle for wiring run-level abort to Ctrl-C.
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            flag: Arc::clone(&self.abort_flag),
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Refresh one named service, attempting even when it is marked
    /// blocked-on-human. A successful renewal clears the block.
    pub async fn refresh_one(
        &self,
        service: &ServiceDefinition,
        run_id: Uuid,
        force: bool,
    ) -> ServiceOutcome {
        let options = RefreshOptions {
            force,
            attempt_blocked: true,
        };
        let mut pass = self
            .refresh_all(std::slice::from_ref(service), run_id, options)
            .await;
        pass.outcomes.pop().unwrap_or_else(|| {
            ServiceOutcome::new(service.id.clone(), OutcomeKind::Cancelled)
                .with_detail("aborted before the attempt was scheduled")
        })
    }

    /// Run a refresh pass over `services` in priority order.
    ///
    /// Attempts run concurrently up to the configured limit until any
    /// outcome demands an operator step; the rest of the pass is then
    /// serial. An abort signal stops scheduling, gives in-flight
    /// attempts a grace period, and discards unfinished ones as
    /// cancelled.
    pub async fn refresh_all(
        &self,
        services: &[ServiceDefinition],
        run_id: Uuid,
        options: RefreshOptions,
    ) -> RefreshPass {
        let mut ordered: Vec<ServiceDefinition> = services.to_vec();
        ordered.sort_by_key(|s| s.priority.rank());

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let interactive_seen = Arc::new(AtomicBool::new(false));
        let mut join_set: JoinSet<ServiceOutcome> = JoinSet::new();
        let mut outcomes = Vec::with_capacity(ordered.len());
        let mut aborted = false;

        for service in ordered {
            if self.abort_flag.load(Ordering::SeqCst) {
                aborted = true;
                break;
            }

            let strategy = match self.strategies.get(&service.id) {
                Some(strategy) => Arc::clone(strategy),
                None => {
                    error!(service = %service.id, "no renewal strategy configured");
                    outcomes.push(
                        ServiceOutcome::new(service.id.clone(), OutcomeKind::Failed)
                            .with_detail("no renewal strategy configured"),
                    );
                    continue;
                }
            };

            if interactive_seen.load(Ordering::SeqCst) {
                // An operator step surfaced; drain in-flight attempts and
                // process the rest one at a time.
                while let Some(joined) = join_set.join_next().await {
                    match joined {
                        Ok(outcome) => outcomes.push(outcome),
                        Err(err) => error!(error = %err, "refresh worker panicked"),
                    }
                }
                outcomes.push(
                    Self::refresh_service(
                        service,
                        Arc::clone(&self.store),
                        strategy,
                        self.config.clone(),
                        self.policy.clone(),
                        run_id,
                        options,
                        Arc::clone(&interactive_seen),
                        self.shutdown_tx.subscribe(),
                    )
                    .await,
                );
                continue;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let store = Arc::clone(&self.store);
            let config = self.config.clone();
            let policy = self.policy.clone();
            let seen = Arc::clone(&interactive_seen);
            let shutdown_rx = self.shutdown_tx.subscribe();

            join_set.spawn(async move {
                let outcome = Self::refresh_service(
                    service, store, strategy, config, policy, run_id, options, seen, shutdown_rx,
                )
                .await;
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => error!(error = %err, "refresh worker panicked"),
            }
        }

        let aborted = aborted
            || self.abort_flag.load(Ordering::SeqCst)
            || outcomes.iter().any(|o| o.outcome == OutcomeKind::Cancelled);

        RefreshPass { outcomes, aborted }
    }

    /// Process one service end to end: advisory lock, classification,
    /// attempt loop, store writes, unlock.
    #[allow(clippy::too_many_arguments)]
    async fn refresh_service(
        service: ServiceDefinition,
        store: Arc<dyn SessionStore>,
        strategy: Arc<dyn RefreshStrategy>,
        config: OrchestratorConfig,
        policy: ExpirationPolicy,
        run_id: Uuid,
        options: RefreshOptions,
        interactive_seen: Arc<AtomicBool>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> ServiceOutcome {
        let now = chrono::Utc::now();
        let ttl = chrono::Duration::seconds(config.lock_ttl_secs.min(i64::MAX as u64) as i64);

        match store.try_lock(&service.id, run_id, ttl, now).await {
            Ok(true) => {}
            Ok(false) => {
                info!(service = %service.id, "advisory lock held elsewhere, skipping");
                return ServiceOutcome::new(service.id.clone(), OutcomeKind::Skipped)
                    .with_detail("advisory lock held by another warden instance");
            }
            Err(err) => {
                error!(service = %service.id, error = %err, "failed to take advisory lock");
                return ServiceOutcome::new(service.id.clone(), OutcomeKind::StorageError)
                    .with_detail(err.to_string());
            }
        }

        let outcome = Self::attempt_locked(
            &service,
            &store,
            &strategy,
            &config,
            &policy,
            options,
            &interactive_seen,
            shutdown_rx,
        )
        .await;

        if let Err(err) = store.unlock(&service.id, run_id).await {
            warn!(service = %service.id, error = %err, "failed to release advisory lock");
        }

        outcome
    }

    /// The attempt loop, entered with the advisory lock held.
    #[allow(clippy::too_many_arguments)]
    async fn attempt_locked(
        service: &ServiceDefinition,
        store: &Arc<dyn SessionStore>,
        strategy: &Arc<dyn RefreshStrategy>,
        config: &OrchestratorConfig,
        policy: &ExpirationPolicy,
        options: RefreshOptions,
        interactive_seen: &Arc<AtomicBool>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> ServiceOutcome {
        let record = match store.get(&service.id).await {
            Ok(record) => record,
            Err(err) => {
                error!(service = %service.id, error = %err, "failed to read session record");
                return ServiceOutcome::new(service.id.clone(), OutcomeKind::StorageError)
                    .with_detail(err.to_string());
            }
        };

        if let Some(ref existing) = record {
            if existing.is_blocked() && !options.attempt_blocked {
                let reason = existing
                    .blocked_reason
                    .clone()
                    .unwrap_or_else(|| "operator step required".to_string());
                info!(service = %service.id, %reason, "renewal suspended, skipping");
                return ServiceOutcome::new(service.id.clone(), OutcomeKind::Skipped)
                    .with_detail(format!("renewal suspended: {reason}"));
            }
        }

        let now = chrono::Utc::now();
        let status = policy.classify(record.as_ref(), service, now);
        if status == SessionStatus::Fresh && !options.force {
            debug!(service = %service.id, "session still fresh, no attempt");
            return ServiceOutcome::new(service.id.clone(), OutcomeKind::Fresh);
        }

        let grace = Duration::from_secs(config.grace_period_secs);
        let mut attempt: u32 = 0;
        let mut abort_observed = false;

        loop {
            info!(
                service = %service.id,
                mechanism = ?service.mechanism,
                status = %status.as_str(),
                attempt,
                "attempting renewal"
            );

            let attempt_fut = strategy.attempt(service, record.as_ref());
            tokio::pin!(attempt_fut);

            let outcome = tokio::select! {
                outcome = &mut attempt_fut => outcome,
                _ = shutdown_rx.recv() => {
                    abort_observed = true;
                    match timeout(grace, &mut attempt_fut).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            info!(service = %service.id, "attempt discarded at abort");
                            return ServiceOutcome::new(
                                service.id.clone(),
                                OutcomeKind::Cancelled,
                            )
                            .with_detail("aborted mid-attempt");
                        }
                    }
                }
            };

            match outcome {
                RefreshOutcome::Renewed { payload } => {
                    let now = chrono::Utc::now();
                    let updated = match record {
                        Some(ref existing) => {
                            let mut next = existing.clone();
                            next.renewed(payload, now);
                            next
                        }
                        None => SessionRecord::new(service.id.clone(), payload, now),
                    };
                    if let Err(err) = store.put(&updated).await {
                        error!(service = %service.id, error = %err, "failed to persist renewal");
                        return ServiceOutcome::new(service.id.clone(), OutcomeKind::StorageError)
                            .with_detail(err.to_string());
                    }
                    info!(service = %service.id, "session renewed");
                    return ServiceOutcome::new(service.id.clone(), OutcomeKind::Renewed);
                }
                RefreshOutcome::RequiresInteractiveStep { reason } => {
                    interactive_seen.store(true, Ordering::SeqCst);
                    let now = chrono::Utc::now();
                    match store.mark_blocked(&service.id, &reason, now).await {
                        Ok(marked) => {
                            if !marked {
                                debug!(
                                    service = %service.id,
                                    "no session record to mark blocked"
                                );
                            }
                        }
                        Err(err) => {
                            warn!(
                                service = %service.id,
                                error = %err,
                                "failed to mark service blocked"
                            );
                        }
                    }
                    warn!(service = %service.id, %reason, "renewal needs an operator step");
                    return ServiceOutcome::new(service.id.clone(), OutcomeKind::BlockedOnHuman)
                        .with_detail(reason);
                }
                RefreshOutcome::Failed { kind, detail } => {
                    let now = chrono::Utc::now();
                    let failures = match store.record_failure(&service.id, now).await {
                        Ok(count) => count,
                        Err(err) => {
                            warn!(
                                service = %service.id,
                                error = %err,
                                "failed to record renewal failure"
                            );
                            0
                        }
                    };
                    warn!(
                        service = %service.id,
                        kind = %kind.as_str(),
                        failures,
                        attempt,
                        "renewal attempt failed: {detail}"
                    );

                    let retryable =
                        kind.is_transient() && attempt < config.retry_bound && !abort_observed;
                    if !retryable {
                        return ServiceOutcome::new(service.id.clone(), OutcomeKind::Failed)
                            .with_detail(format!("{}: {detail}", kind.as_str()));
                    }

                    let backoff = Self::backoff_delay(config, attempt);
                    debug!(service = %service.id, backoff_ms = backoff.as_millis() as u64, "backing off");
                    tokio::select! {
                        () = sleep(backoff) => {}
                        _ = shutdown_rx.recv() => {
                            return ServiceOutcome::new(service.id.clone(), OutcomeKind::Failed)
                                .with_detail(format!("{}: {detail}", kind.as_str()));
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Exponential backoff: initial delay doubled per attempt, capped.
    fn backoff_delay(config: &OrchestratorConfig, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let ms = config
            .retry_initial_backoff_ms
            .saturating_mul(factor)
            .min(config.retry_max_backoff_ms);
        Duration::from_millis(ms)
    }
}
