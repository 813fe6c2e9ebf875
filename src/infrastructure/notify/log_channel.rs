//! Log-based alert channel.
//!
//! Always configured; alerts land in the structured log stream where
//! the host's log shipping picks them up.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::errors::WardenResult;
use crate::domain::models::HealthAlert;
use crate::domain::ports::NotificationChannel;

pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &HealthAlert) -> WardenResult<()> {
        warn!(
            service = %alert.service_id,
            score = alert.score,
            kind = ?alert.kind,
            "{}",
            alert.message
        );
        Ok(())
    }
}
