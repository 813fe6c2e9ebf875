//! Warden - credential and pipeline health control loop
//!
//! Warden watches the auth sessions and stage artifacts of an unattended
//! batch data pipeline: it classifies per-service session freshness,
//! renews credentials ahead of expiry (surfacing the cases that need a
//! human), inspects stage directories for stale or stuck data, scores
//! everything into a 0-100 health report, and notifies on degradation.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, ports, and the error taxonomy
//! - **Service Layer** (`services`): Expiration policy, freshness inspection, scoring
//! - **Application Layer** (`application`): Refresh orchestration and the pipeline run
//! - **Infrastructure Layer** (`infrastructure`): SQLite stores, renewal strategies,
//!   notifications, config, logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use warden::application::{PipelineOptions, PipelineRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire stores and strategies, then drive one control-loop run
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{PipelineOptions, PipelineRunner, RefreshOrchestrator};
pub use domain::errors::{RefreshErrorKind, WardenError, WardenResult};
pub use domain::models::{
    HealthReport, HealthTier, OutcomeKind, RunRecord, ServiceDefinition, ServiceOutcome,
    SessionRecord, SessionStatus, WardenConfig,
};
pub use domain::ports::{RefreshOutcome, RefreshStrategy, RunRecorder, SessionStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ExpirationPolicy, HealthScorer, ZoneFreshnessInspector};
