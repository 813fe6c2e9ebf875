//! Webhook alert channel.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::errors::{WardenError, WardenResult};
use crate::domain::models::HealthAlert;
use crate::domain::ports::NotificationChannel;

/// Posts each alert as JSON to a configured endpoint.
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for webhook")?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, alert: &HealthAlert) -> WardenResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .map_err(|e| WardenError::NotificationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WardenError::NotificationFailed(format!(
                "webhook returned {status}: {body}"
            )));
        }

        Ok(())
    }
}
