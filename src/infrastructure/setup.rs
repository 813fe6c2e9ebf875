//! Workspace initialization.
//!
//! Handles `warden init`:
//! - Configuration directory creation
//! - Default config file creation
//! - Database migrations
//! - Pipeline stage directory skeleton

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Warden Configuration
# Override settings by editing this file or setting environment variables
# with WARDEN_ prefix
#
# Example environment variables:
#   export WARDEN_DATABASE__PATH=/custom/path/warden.db
#   export WARDEN_ORCHESTRATOR__MAX_CONCURRENT=4
#   export WARDEN_ORCHESTRATOR__UNATTENDED=true
#   export WARDEN_LOGGING__LEVEL=debug

# Database configuration
database:
  # Path to SQLite database file (project-local)
  path: ".warden/warden.db"

  # Maximum number of database connections in pool
  max_connections: 5

# Pipeline stage layout
pipeline:
  # Root directory the stage directories live under
  root: "./pipeline"

  # Ordered stage sequence, earliest first
  stages:
    - landing
    - raw
    - staging
    - curated

  # Days a later stage may trail an earlier one before it counts as stuck
  propagation_lag_days: 1

  # Where the latest health report snapshot is written
  report_path: ".warden/health_report.json"
  report_text_path: ".warden/health_report.txt"

  # Per-extractor timeout during the hand-off, in seconds
  extractor_timeout_secs: 600

# Refresh orchestration
orchestrator:
  # Concurrent renewal attempts while no interactive step is pending
  max_concurrent: 1

  # In-run retries after the first failed attempt (transient failures only)
  retry_bound: 2

  # Retry backoff in milliseconds, doubled per attempt up to the ceiling
  retry_initial_backoff_ms: 1000
  retry_max_backoff_ms: 30000

  # Per-attempt timeout for helper processes and token endpoints
  attempt_timeout_secs: 120

  # How long an in-flight attempt may finish after Ctrl-C
  grace_period_secs: 5

  # Advisory session lock lease, in seconds
  lock_ttl_secs: 600

  # Set true on schedulers with no operator present; interactive
  # mechanisms then report blocked-on-human instead of prompting
  unattended: false

# Health scoring weights and tier cut-offs
scoring:
  expired_penalty: 60
  expiring_penalty: 20
  unknown_penalty: 40
  stale_stage_penalty: 10
  stuck_stage_penalty: 15
  repeated_failure_penalty: 10
  healthy_floor: 80
  degraded_floor: 40

# Notifications
notifications:
  # JSON POST target for degradation alerts; disabled when unset
  # webhook_url: "https://hooks.example.com/warden"
  timeout_secs: 10

# Logging configuration
logging:
  # Log level: trace, debug, info, warn, error
  level: "info"

  # Log format: json, pretty
  format: "pretty"

  # Uncomment for daily-rotated JSON log files
  # directory: ".warden/logs"

# The service registry. Each entry is one upstream platform whose
# auth session warden tracks.
services: []
#  - id: "spotify"
#    mechanism: "interactive_browser"
#    max_age_days: 30
#    renewal_interval_days: 7
#    interactive: true
#    priority: "high"
#    stale_after_days: 3
#    extractor_command: ["python", "extractors/spotify.py"]
#    file_hints: ["spotify"]
#
#  - id: "reporting-api"
#    mechanism: "silent_exchange"
#    max_age_days: 14
#    renewal_interval_days: 2
#    interactive: false
#    priority: "critical"
#    token_endpoint: "https://reporting.example.com/oauth/token"
#    extractor_command: ["python", "extractors/reporting.py"]
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl SetupPaths {
    /// Get setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::in_dir(&current_dir))
    }

    /// Get setup paths rooted at an explicit directory
    pub fn in_dir(base: &Path) -> Self {
        let config_dir = base.join(".warden");
        Self {
            config_file: config_dir.join("config.yaml"),
            database_file: config_dir.join("warden.db"),
            config_dir,
        }
    }

    /// Check if warden is already initialized
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }
}

/// Create the configuration directory
pub fn create_config_dir(paths: &SetupPaths, force: bool) -> Result<()> {
    if paths.config_dir.exists() && !force {
        return Ok(());
    }

    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")?;

    Ok(())
}

/// Create the default configuration file
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<()> {
    if paths.config_file.exists() && !force {
        return Ok(());
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;

    Ok(())
}

/// Create the pipeline root with one directory per stage.
///
/// Existing directories are left untouched; extractors may already have
/// written artifacts into them.
pub fn create_pipeline_dirs(root: &Path, stages: &[String]) -> Result<()> {
    for stage in stages {
        let dir = root.join(stage);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create stage directory {}", dir.display()))?;
    }

    Ok(())
}

/// Run database migrations
pub async fn run_migrations(paths: &SetupPaths, force: bool) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = paths.database_file.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", paths.database_file.display());

    let db_exists = paths.database_file.exists();

    if db_exists && !force {
        return Ok(());
    }

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    pool.close().await;

    Ok(())
}
