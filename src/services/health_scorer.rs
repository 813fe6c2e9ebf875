//! Health scoring.
//!
//! Combines session status, stage freshness, and renewal failure history
//! into a per-service 0-100 score, a severity tier, and a pipeline-wide
//! verdict. Scores start at 100 and lose configured penalty points per
//! condition, floored at zero.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::models::{
    FreshnessSnapshot, HealthIssue, HealthReport, HealthTier, IssueKind, ScoringConfig,
    ServiceDefinition, ServiceHealth, SessionRecord, SessionStatus,
};
use crate::services::expiration::ExpirationPolicy;

/// Computes per-service scores and the pipeline verdict.
#[derive(Debug, Clone)]
pub struct HealthScorer {
    weights: ScoringConfig,
    retry_bound: u32,
    policy: ExpirationPolicy,
}

impl HealthScorer {
    pub fn new(weights: ScoringConfig, retry_bound: u32) -> Self {
        Self {
            weights,
            retry_bound,
            policy: ExpirationPolicy::new(),
        }
    }

    /// Score one service from its record and stage freshness.
    pub fn score_service(
        &self,
        definition: &ServiceDefinition,
        record: Option<&SessionRecord>,
        snapshot: &FreshnessSnapshot,
        now: DateTime<Utc>,
    ) -> ServiceHealth {
        let status = self.policy.classify(record, definition, now);
        let mut issues = Vec::new();

        match status {
            SessionStatus::Expired => {
                let days_over = record
                    .map(|r| age_days(now, r.expires_at(definition)))
                    .unwrap_or(0.0);
                issues.push(HealthIssue::new(
                    IssueKind::Credential,
                    format!("session expired {days_over:.1} days ago"),
                    self.weights.expired_penalty,
                ));
            }
            SessionStatus::Expiring => {
                let days_left = record
                    .map(|r| age_days(r.expires_at(definition), now))
                    .unwrap_or(0.0);
                issues.push(HealthIssue::new(
                    IssueKind::Credential,
                    format!("session expires in {days_left:.1} days"),
                    self.weights.expiring_penalty,
                ));
            }
            SessionStatus::Unknown => {
                issues.push(HealthIssue::new(
                    IssueKind::Credential,
                    "no session on record",
                    self.weights.unknown_penalty,
                ));
            }
            SessionStatus::Fresh => {}
        }

        for stage in snapshot.for_service(&definition.id) {
            if stage.stale {
                let age = stage.age_days.unwrap_or(0.0);
                issues.push(HealthIssue::new(
                    IssueKind::StaleStage,
                    format!(
                        "{} artifact is {age:.1} days old (threshold {} days)",
                        stage.stage, definition.stale_after_days
                    ),
                    self.weights.stale_stage_penalty,
                ));
            }
            if stage.stuck {
                issues.push(HealthIssue::new(
                    IssueKind::StuckStage,
                    format!(
                        "{} stopped receiving data despite newer upstream artifacts",
                        stage.stage
                    ),
                    self.weights.stuck_stage_penalty,
                ));
            }
        }

        // Environmental finding, reported without a score penalty.
        for stage in &snapshot.missing_stages {
            issues.push(HealthIssue::new(
                IssueKind::MissingStage,
                format!("stage directory {stage} is missing under the pipeline root"),
                0,
            ));
        }

        let blocked_on_human = record.is_some_and(SessionRecord::is_blocked);
        if let Some(record) = record {
            let excess = record.failure_count.saturating_sub(self.retry_bound);
            if excess > 0 {
                issues.push(HealthIssue::new(
                    IssueKind::RepeatedFailure,
                    format!(
                        "{} consecutive renewal failures (retry bound {})",
                        record.failure_count, self.retry_bound
                    ),
                    excess * self.weights.repeated_failure_penalty,
                ));
            }
            if let Some(reason) = &record.blocked_reason {
                issues.push(HealthIssue::new(
                    IssueKind::BlockedOnHuman,
                    format!("renewal suspended pending an operator step: {reason}"),
                    0,
                ));
            }
        }

        let total_penalty: u32 = issues.iter().map(|i| i.penalty).sum();
        let score = 100u32.saturating_sub(total_penalty) as u8;

        ServiceHealth {
            service_id: definition.id.clone(),
            priority: definition.priority,
            session_status: status,
            score,
            tier: self.tier_for(score),
            blocked_on_human,
            issues,
            expires_at: self.policy.expires_at(record, definition),
            next_action_at: self.policy.next_action_time(record, definition),
        }
    }

    /// Build the consolidated report for one run.
    ///
    /// Always recomputed from current state; never cached.
    pub fn build_report(
        &self,
        run_id: Uuid,
        services: &[ServiceDefinition],
        records: &HashMap<String, SessionRecord>,
        snapshot: &FreshnessSnapshot,
        now: DateTime<Utc>,
    ) -> HealthReport {
        let mut scored: Vec<ServiceHealth> = services
            .iter()
            .map(|def| self.score_service(def, records.get(&def.id), snapshot, now))
            .collect();
        scored.sort_by(|a, b| b.tier.cmp(&a.tier).then(a.priority.rank().cmp(&b.priority.rank())));

        let verdict = Self::verdict(&scored);
        let recommendations = Self::recommendations(&scored);

        HealthReport {
            run_id,
            generated_at: now,
            services: scored,
            verdict,
            recommendations,
        }
    }

    fn tier_for(&self, score: u8) -> HealthTier {
        if score >= self.weights.healthy_floor {
            HealthTier::Healthy
        } else if score >= self.weights.degraded_floor {
            HealthTier::Degraded
        } else {
            HealthTier::Critical
        }
    }

    /// Worst weighted tier. Low-priority services are demoted one step
    /// before aggregation, so a critical high-priority service always
    /// forces a critical verdict while a flaky low-priority one cannot.
    fn verdict(services: &[ServiceHealth]) -> HealthTier {
        services
            .iter()
            .map(|s| {
                if s.priority.weighs_full() {
                    s.tier
                } else {
                    s.tier.demoted()
                }
            })
            .max()
            .unwrap_or(HealthTier::Healthy)
    }

    /// Remediation actions derived from issues, most urgent first.
    /// `services` must already be sorted worst-first.
    fn recommendations(services: &[ServiceHealth]) -> Vec<String> {
        let mut lines = Vec::new();
        for service in services {
            let id = &service.service_id;
            if service.blocked_on_human {
                lines.push(format!(
                    "Complete the interactive login for {id}, then run: warden refresh --service {id}"
                ));
            }
            match service.session_status {
                SessionStatus::Expired => {
                    lines.push(format!("Renew {id} now: warden refresh --service {id}"));
                }
                SessionStatus::Unknown => {
                    lines.push(format!(
                        "Authenticate {id} for the first time: warden refresh --service {id}"
                    ));
                }
                SessionStatus::Expiring => {
                    lines.push(format!("Renew {id} before it expires: warden refresh --service {id}"));
                }
                SessionStatus::Fresh => {}
            }
            for issue in &service.issues {
                match issue.kind {
                    IssueKind::StuckStage => lines.push(format!(
                        "Investigate {id}: {}",
                        issue.message
                    )),
                    IssueKind::StaleStage => lines.push(format!(
                        "Re-run the {id} extractor: {}",
                        issue.message
                    )),
                    _ => {}
                }
            }
        }
        lines
    }
}

fn age_days(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    later.signed_duration_since(earlier).num_seconds() as f64 / 86_400.0
}
