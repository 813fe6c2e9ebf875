pub mod config;
pub mod freshness;
pub mod health;
pub mod run;
pub mod service;
pub mod session;

pub use config::{
    DatabaseConfig, LoggingConfig, NotificationConfig, OrchestratorConfig, PipelineConfig,
    ScoringConfig, WardenConfig,
};
pub use freshness::{FreshnessSnapshot, StageFreshness};
pub use health::{
    AlertKind, HealthAlert, HealthIssue, HealthReport, HealthTier, IssueKind, ServiceHealth,
};
pub use run::{OutcomeKind, RunRecord, RunStatus, ServiceOutcome};
pub use service::{AuthMechanism, PriorityClass, ServiceDefinition};
pub use session::{SessionRecord, SessionStatus};
