//! Structured logging setup.
//!
//! Backed by `tracing`, with an optional daily-rotated JSON log file
//! next to the console layer.

pub mod logger;

pub use logger::Logger;
