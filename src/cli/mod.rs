//! Command-line interface.
//!
//! A thin layer over the application services: argument parsing, context
//! wiring, and output rendering. Commands map the health verdict to the
//! process exit code (0 healthy, 1 degraded, 2 critical) so cron and
//! systemd wrappers can gate on it.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};
