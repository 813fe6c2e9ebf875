//! Domain services.
//!
//! Pure decision logic with no I/O beyond filesystem reads in the
//! freshness inspector. Persistence and transport live in
//! `infrastructure`.

pub mod expiration;
pub mod freshness_inspector;
pub mod health_scorer;

pub use expiration::ExpirationPolicy;
pub use freshness_inspector::ZoneFreshnessInspector;
pub use health_scorer::HealthScorer;
