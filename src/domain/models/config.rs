//! Process-wide configuration.
//!
//! Loaded once at startup into an immutable [`WardenConfig`] and passed
//! explicitly to every component. No component reads configuration
//! ambiently after startup.

use serde::{Deserialize, Serialize};

use super::service::ServiceDefinition;

/// Main configuration structure for warden.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WardenConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Pipeline stage layout and report paths
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Refresh orchestration tuning
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Health scoring weights and tier cut-offs
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Notification channels
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The service registry
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
}

impl WardenConfig {
    /// Looks up a service definition by id.
    pub fn service(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.id == id)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".warden/warden.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Pipeline stage layout and report paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Root directory the stage directories live under
    #[serde(default = "default_pipeline_root")]
    pub root: String,

    /// Ordered stage sequence, earliest first
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,

    /// Days a later stage may trail an earlier one before it counts
    /// as stuck
    #[serde(default = "default_propagation_lag_days")]
    pub propagation_lag_days: i64,

    /// Where the latest JSON report snapshot is written
    #[serde(default = "default_report_path")]
    pub report_path: String,

    /// Where the human-readable report rendering is written
    #[serde(default = "default_report_text_path")]
    pub report_text_path: String,

    /// Per-extractor timeout during the hand-off, in seconds
    #[serde(default = "default_extractor_timeout_secs")]
    pub extractor_timeout_secs: u64,
}

fn default_pipeline_root() -> String {
    "./pipeline".to_string()
}

fn default_stages() -> Vec<String> {
    vec![
        "landing".to_string(),
        "raw".to_string(),
        "staging".to_string(),
        "curated".to_string(),
    ]
}

const fn default_propagation_lag_days() -> i64 {
    1
}

fn default_report_path() -> String {
    ".warden/health_report.json".to_string()
}

fn default_report_text_path() -> String {
    ".warden/health_report.txt".to_string()
}

const fn default_extractor_timeout_secs() -> u64 {
    600
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: default_pipeline_root(),
            stages: default_stages(),
            propagation_lag_days: default_propagation_lag_days(),
            report_path: default_report_path(),
            report_text_path: default_report_text_path(),
            extractor_timeout_secs: default_extractor_timeout_secs(),
        }
    }
}

/// Refresh orchestration tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// Concurrent renewal attempts while no interactive step is pending
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// In-run retries after the first failed attempt, transient kinds only
    #[serde(default = "default_retry_bound")]
    pub retry_bound: u32,

    /// Initial retry backoff in milliseconds, doubled per attempt
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,

    /// Per-attempt timeout for strategy network and process work
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// How long an in-flight attempt may finish after an abort
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,

    /// Advisory lock lease lifetime
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,

    /// Interactive mechanisms refuse to prompt when set
    #[serde(default)]
    pub unattended: bool,
}

const fn default_max_concurrent() -> usize {
    1
}

const fn default_retry_bound() -> u32 {
    2
}

const fn default_retry_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_retry_max_backoff_ms() -> u64 {
    30_000
}

const fn default_attempt_timeout_secs() -> u64 {
    120
}

const fn default_grace_period_secs() -> u64 {
    5
}

const fn default_lock_ttl_secs() -> u64 {
    600
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            retry_bound: default_retry_bound(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            grace_period_secs: default_grace_period_secs(),
            lock_ttl_secs: default_lock_ttl_secs(),
            unattended: false,
        }
    }
}

/// Health scoring weights and tier cut-offs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoringConfig {
    /// Penalty for an expired session
    #[serde(default = "default_expired_penalty")]
    pub expired_penalty: u32,

    /// Penalty for an expiring session
    #[serde(default = "default_expiring_penalty")]
    pub expiring_penalty: u32,

    /// Penalty when no session record exists
    #[serde(default = "default_unknown_penalty")]
    pub unknown_penalty: u32,

    /// Penalty per stale stage
    #[serde(default = "default_stale_stage_penalty")]
    pub stale_stage_penalty: u32,

    /// Penalty per stuck stage
    #[serde(default = "default_stuck_stage_penalty")]
    pub stuck_stage_penalty: u32,

    /// Penalty per consecutive failure beyond the retry bound
    #[serde(default = "default_repeated_failure_penalty")]
    pub repeated_failure_penalty: u32,

    /// Minimum score for the healthy tier
    #[serde(default = "default_healthy_floor")]
    pub healthy_floor: u8,

    /// Minimum score for the degraded tier
    #[serde(default = "default_degraded_floor")]
    pub degraded_floor: u8,
}

const fn default_expired_penalty() -> u32 {
    60
}

const fn default_expiring_penalty() -> u32 {
    20
}

const fn default_unknown_penalty() -> u32 {
    40
}

const fn default_stale_stage_penalty() -> u32 {
    10
}

const fn default_stuck_stage_penalty() -> u32 {
    15
}

const fn default_repeated_failure_penalty() -> u32 {
    10
}

const fn default_healthy_floor() -> u8 {
    80
}

const fn default_degraded_floor() -> u8 {
    40
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            expired_penalty: default_expired_penalty(),
            expiring_penalty: default_expiring_penalty(),
            unknown_penalty: default_unknown_penalty(),
            stale_stage_penalty: default_stale_stage_penalty(),
            stuck_stage_penalty: default_stuck_stage_penalty(),
            repeated_failure_penalty: default_repeated_failure_penalty(),
            healthy_floor: default_healthy_floor(),
            degraded_floor: default_degraded_floor(),
        }
    }
}

/// Notification channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationConfig {
    /// JSON POST target; the webhook channel is disabled when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Per-delivery timeout in seconds
    #[serde(default = "default_notification_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_notification_timeout_secs() -> u64 {
    10
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_notification_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for daily-rotated log files; stderr only when unset
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            directory: None,
        }
    }
}
