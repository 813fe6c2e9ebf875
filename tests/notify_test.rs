use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use warden::domain::models::{
    AlertKind, HealthAlert, HealthIssue, HealthReport, HealthTier, IssueKind, PriorityClass,
    ServiceHealth, SessionStatus,
};
use warden::domain::ports::NotificationChannel;
use warden::infrastructure::notify::{NotificationDispatcher, WebhookChannel};

fn alert(service_id: &str) -> HealthAlert {
    HealthAlert {
        service_id: service_id.to_string(),
        kind: AlertKind::TierDegraded {
            from: HealthTier::Healthy,
            to: HealthTier::Degraded,
        },
        score: 60,
        message: format!("{service_id} dropped from healthy to degraded (score 60)"),
        occurred_at: Utc::now(),
    }
}

fn service_health(id: &str, tier: HealthTier) -> ServiceHealth {
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
        blocked_on_human: false,
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

#[tokio::test]
async fn test_webhook_delivers_alert_as_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/hooks/warden")
        .match_header("content-type", "application/json")
        .with_status(200)
        .create_async()
        .await;

    let channel = WebhookChannel::new(
        format!("{}/hooks/warden", server.url()),
        Duration::from_secs(5),
    )
    .unwrap();

    channel
        .deliver(&alert("spotify"))
        .await
        .expect("delivery should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_failure_is_counted_not_propagated() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/hooks/warden")
        .with_status(500)
        .with_body("downstream broken")
        .create_async()
        .await;

    let channel: Arc<dyn NotificationChannel> = Arc::new(
        WebhookChannel::new(
            format!("{}/hooks/warden", server.url()),
            Duration::from_secs(5),
        )
        .unwrap(),
    );
    let dispatcher = NotificationDispatcher::new(vec![channel]);

    let failures = dispatcher.dispatch(&[alert("spotify"), alert("distrokid")]).await;
    assert_eq!(failures, 2);
}

#[tokio::test]
async fn test_dispatch_without_alerts_is_a_no_op() {
    let dispatcher = NotificationDispatcher::new(vec![]);
    assert_eq!(dispatcher.dispatch(&[]).await, 0);
}

#[test]
fn test_first_report_does_not_alert_on_bad_tiers() {
    let current = report(vec![
        service_health("spotify", HealthTier::Critical),
        service_health("distrokid", HealthTier::Degraded),
    ]);

    let alerts = NotificationDispatcher::diff_reports(None, &current, Utc::now());
    assert!(alerts.is_empty());
}

#[test]
fn test_first_report_still_alerts_on_blocked_services() {
    let mut blocked = service_health("tiktok", HealthTier::Degraded);
    blocked.blocked_on_human = true;
    blocked.issues = vec![HealthIssue::new(
        IssueKind::BlockedOnHuman,
        "browser login required",
        0,
    )];
    let current = report(vec![blocked]);

    let alerts = NotificationDispatcher::diff_reports(None, &current, Utc::now());

    assert_eq!(alerts.len(), 1);
    assert!(matches!(
        &alerts[0].kind,
        AlertKind::BlockedOnHuman { reason } if reason == "browser login required"
    ));
}

#[test]
fn test_tier_drop_alerts_with_details() {
    let previous = report(vec![service_health("spotify", HealthTier::Healthy)]);
    let current = report(vec![service_health("spotify", HealthTier::Critical)]);

    let alerts = NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].service_id, "spotify");
    assert!(matches!(
        alerts[0].kind,
        AlertKind::TierDegraded {
            from: HealthTier::Healthy,
            to: HealthTier::Critical,
        }
    ));
}

#[test]
fn test_steady_degradation_stays_quiet() {
    let previous = report(vec![service_health("spotify", HealthTier::Degraded)]);
    let current = report(vec![service_health("spotify", HealthTier::Degraded)]);

    let alerts = NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());
    assert!(alerts.is_empty());
}

#[test]
fn test_recovery_never_alerts() {
    let previous = report(vec![service_health("spotify", HealthTier::Critical)]);
    let current = report(vec![service_health("spotify", HealthTier::Healthy)]);

    let alerts = NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());
    assert!(alerts.is_empty());
}

#[test]
fn test_already_blocked_service_does_not_realert() {
    let mut before = service_health("tiktok", HealthTier::Degraded);
    before.blocked_on_human = true;
    let mut after = service_health("tiktok", HealthTier::Degraded);
    after.blocked_on_human = true;

    let previous = report(vec![before]);
    let current = report(vec![after]);

    let alerts = NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());
    assert!(alerts.is_empty());
}

#[test]
fn test_new_service_in_current_report_is_treated_as_first_sight() {
    let previous = report(vec![service_health("spotify", HealthTier::Healthy)]);
    let current = report(vec![
        service_health("spotify", HealthTier::Healthy),
        service_health("bandcamp", HealthTier::Critical),
    ]);

    let alerts = NotificationDispatcher::diff_reports(Some(&previous), &current, Utc::now());
    assert!(alerts.is_empty());
}
