//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - `SessionStore`: durable session credential state
//! - `RunRecorder`: append-only run history
//! - `RefreshStrategy`: one renewal mechanism per auth variant
//! - `NotificationChannel`: one alert delivery target
//!
//! These contracts keep the domain independent of specific
//! infrastructure implementations.

pub mod notification;
pub mod refresh_strategy;
pub mod run_recorder;
pub mod session_store;

pub use notification::NotificationChannel;
pub use refresh_strategy::{RefreshOutcome, RefreshStrategy};
pub use run_recorder::RunRecorder;
pub use session_store::SessionStore;
