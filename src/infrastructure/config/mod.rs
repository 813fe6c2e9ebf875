//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading from .warden/
//! - Environment variable overrides (WARDEN_*)
//! - Validation of service definitions and tuning knobs

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
