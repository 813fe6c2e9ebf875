//! Domain layer for the warden control loop
//!
//! This module contains core business logic and domain models.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{RefreshErrorKind, WardenError, WardenResult};
