//! Alert computation and delivery.
//!
//! Alerts fire on transitions, not states: a tier that worsened since
//! the previous persisted report, or a service newly blocked on a human
//! step. A service that stays degraded run after run stays quiet.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::log_channel::LogChannel;
use super::webhook::WebhookChannel;
use crate::domain::models::{
    AlertKind, HealthAlert, HealthReport, IssueKind, NotificationConfig,
};
use crate::domain::ports::NotificationChannel;

/// Fans alerts out to every configured channel.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    /// Build the channel set from config: the log channel always, a
    /// webhook when one is configured.
    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        let mut channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(LogChannel)];

        if let Some(url) = &config.webhook_url {
            channels.push(Arc::new(WebhookChannel::new(
                url.clone(),
                Duration::from_secs(config.timeout_secs),
            )?));
        }

        Ok(Self { channels })
    }

    /// Compute the alerts the transition from `previous` to `current`
    /// warrants.
    ///
    /// Without a previous report only blocked-on-human entries alert;
    /// a first run full of unknown services should not page anyone.
    pub fn diff_reports(
        previous: Option<&HealthReport>,
        current: &HealthReport,
        now: DateTime<Utc>,
    ) -> Vec<HealthAlert> {
        let mut alerts = Vec::new();

        for service in &current.services {
            let before = previous.and_then(|p| p.for_service(&service.service_id));

            if let Some(before) = before {
                if service.tier > before.tier {
                    alerts.push(HealthAlert {
                        service_id: service.service_id.clone(),
                        kind: AlertKind::TierDegraded {
                            from: before.tier,
                            to: service.tier,
                        },
                        score: service.score,
                        message: format!(
                            "{} dropped from {} to {} (score {})",
                            service.service_id, before.tier, service.tier, service.score
                        ),
                        occurred_at: now,
                    });
                }
            }

            let was_blocked = before.is_some_and(|b| b.blocked_on_human);
            if service.blocked_on_human && !was_blocked {
                let reason = service
                    .issues
                    .iter()
                    .find(|issue| issue.kind == IssueKind::BlockedOnHuman)
                    .map_or_else(|| "operator step required".to_string(), |issue| {
                        issue.message.clone()
                    });

                alerts.push(HealthAlert {
                    service_id: service.service_id.clone(),
                    kind: AlertKind::BlockedOnHuman {
                        reason: reason.clone(),
                    },
                    score: service.score,
                    message: format!("{} needs a human: {reason}", service.service_id),
                    occurred_at: now,
                });
            }
        }

        alerts
    }

    /// Deliver alerts to every channel, returning the failure count.
    ///
    /// Failures are logged and counted; they never abort the run.
    pub async fn dispatch(&self, alerts: &[HealthAlert]) -> u32 {
        let mut failures = 0;

        for alert in alerts {
            for channel in &self.channels {
                if let Err(e) = channel.deliver(alert).await {
                    warn!(
                        channel = channel.name(),
                        service = %alert.service_id,
                        error = %e,
                        "alert delivery failed"
                    );
                    failures += 1;
                }
            }
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        HealthTier, PriorityClass, ServiceHealth, SessionStatus,
    };
    use uuid::Uuid;

    fn health(id: &str, tier: HealthTier, blocked: bool) -> ServiceHealth {
        ServiceHealth {
            service_id: id.to_string(),
            priority: PriorityClass::Medium,
            session_status: SessionStatus::Fresh,
            score: match tier {
                HealthTier::Healthy => 100,
                HealthTier::Degraded => 60,
                HealthTier::Critical => 20,
            },
            tier,
            blocked_on_human: blocked,
            issues: vec![],
            expires_at: None,
            next_action_at: None,
        }
    }

    fn report(services: Vec<ServiceHealth>) -> HealthReport {
        let verdict = services
            .iter()
            .map(|s| s.tier)
            .max()
            .unwrap_or(HealthTier::Healthy);
        HealthReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            services,
            verdict,
            recommendations: vec![],
        }
    }

    #[test]
    fn test_tier_degradation_alerts() {
        let previous = report(vec![health("spotify", HealthTier::Healthy, false)]);
        let current = report(vec![health("spotify", HealthTier::Degraded, false)]);

        let alerts =
            NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());

        assert_eq!(alerts.len(), 1);
        assert!(matches!(
            alerts[0].kind,
            AlertKind::TierDegraded {
                from: HealthTier::Healthy,
                to: HealthTier::Degraded
            }
        ));
    }

    #[test]
    fn test_improvement_is_silent() {
        let previous = report(vec![health("spotify", HealthTier::Critical, false)]);
        let current = report(vec![health("spotify", HealthTier::Healthy, false)]);

        let alerts =
            NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());

        assert!(alerts.is_empty());
    }

    #[test]
    fn test_steady_state_is_silent() {
        let previous = report(vec![health("spotify", HealthTier::Degraded, false)]);
        let current = report(vec![health("spotify", HealthTier::Degraded, false)]);

        let alerts =
            NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());

        assert!(alerts.is_empty());
    }

    #[test]
    fn test_newly_blocked_alerts() {
        let previous = report(vec![health("tiktok", HealthTier::Degraded, false)]);
        let current = report(vec![health("tiktok", HealthTier::Degraded, true)]);

        let alerts =
            NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());

        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0].kind, AlertKind::BlockedOnHuman { .. }));
    }

    #[test]
    fn test_already_blocked_stays_silent() {
        let previous = report(vec![health("tiktok", HealthTier::Degraded, true)]);
        let current = report(vec![health("tiktok", HealthTier::Degraded, true)]);

        let alerts =
            NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());

        assert!(alerts.is_empty());
    }

    #[test]
    fn test_first_run_alerts_only_on_blocked() {
        let current = report(vec![
            health("spotify", HealthTier::Degraded, false),
            health("tiktok", HealthTier::Critical, true),
        ]);

        let alerts = NotificationDispatcher::diff_reports(None, &current, Utc::now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].service_id, "tiktok");
        assert!(matches!(alerts[0].kind, AlertKind::BlockedOnHuman { .. }));
    }

    #[test]
    fn test_service_absent_from_previous_run() {
        let previous = report(vec![health("spotify", HealthTier::Healthy, false)]);
        let current = report(vec![
            health("spotify", HealthTier::Healthy, false),
            health("linktree", HealthTier::Critical, false),
        ]);

        // A service seen for the first time has no baseline to degrade
        // from.
        let alerts =
            NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());

        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_counts_failures() {
        struct FailingChannel;

        #[async_trait::async_trait]
        impl NotificationChannel for FailingChannel {
            fn name(&self) -> &str {
                "failing"
            }

            async fn deliver(&self, _alert: &HealthAlert) -> crate::domain::errors::WardenResult<()> {
                Err(crate::domain::errors::WardenError::NotificationFailed(
                    "boom".to_string(),
                ))
            }
        }

        let dispatcher = NotificationDispatcher::new(vec![
            Arc::new(LogChannel),
            Arc::new(FailingChannel),
        ]);
        let current = report(vec![health("tiktok", HealthTier::Degraded, true)]);
        let alerts = NotificationDispatcher::diff_reports(None, &current, Utc::now());

        let failures = dispatcher.dispatch(&alerts).await;

        assert_eq!(failures, 1, "only the failing channel counts");
    }
}
