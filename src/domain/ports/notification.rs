//! Notification channel port.

use async_trait::async_trait;

use crate::domain::errors::WardenResult;
use crate::domain::models::HealthAlert;

/// One delivery target for health alerts.
///
/// Delivery is fire-and-forget from the caller's perspective: a failed
/// delivery is logged and counted, never propagated into the run.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name used in logs and failure counts.
    fn name(&self) -> &str;

    /// Deliver one alert.
    async fn deliver(&self, alert: &HealthAlert) -> WardenResult<()>;
}
