//! Infrastructure layer module
//!
//! This module contains all infrastructure adapters and external integrations:
//! - Database implementations (SQLite with sqlx)
//! - Refresh strategies (token endpoints, helper processes)
//! - Notification channels
//! - Health report persistence
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod database;
pub mod logging;
pub mod notify;
pub mod report;
pub mod setup;
pub mod strategies;
