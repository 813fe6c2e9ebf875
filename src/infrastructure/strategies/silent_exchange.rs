//! Silent token-exchange strategy.
//!
//! Posts the stored opaque payload to the service's token endpoint and
//! takes the response body as the replacement payload. Never inspects
//! either payload.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::errors::RefreshErrorKind;
use crate::domain::models::{AuthMechanism, ServiceDefinition, SessionRecord};
use crate::domain::ports::{RefreshOutcome, RefreshStrategy};

/// Renews sessions by exchanging the current credential over HTTPS.
pub struct SilentExchangeStrategy {
    http_client: Client,
}

impl SilentExchangeStrategy {
    /// Build the strategy with a per-attempt request timeout.
    pub fn new(attempt_timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(attempt_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http_client })
    }

    /// Map a non-success status to a failure kind.
    ///
    /// 401/403 mean the stored credential no longer exchanges; 429 and
    /// 5xx are provider-side and worth retrying. Anything else in the
    /// 4xx range indicates the exchange itself is broken.
    fn classify_status(status: StatusCode) -> RefreshErrorKind {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            RefreshErrorKind::InvalidCredential
        } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            RefreshErrorKind::Network
        } else {
            RefreshErrorKind::InvalidCredential
        }
    }
}

#[async_trait]
impl RefreshStrategy for SilentExchangeStrategy {
    fn mechanism(&self) -> AuthMechanism {
        AuthMechanism::SilentExchange
    }

    async fn attempt(
        &self,
        service: &ServiceDefinition,
        existing: Option<&SessionRecord>,
    ) -> RefreshOutcome {
        let Some(record) = existing else {
            return RefreshOutcome::failed(
                RefreshErrorKind::InvalidCredential,
                "no stored credential to exchange",
            );
        };
        let Some(endpoint) = service.token_endpoint.as_deref() else {
            return RefreshOutcome::failed(
                RefreshErrorKind::InvalidCredential,
                "no token endpoint configured",
            );
        };

        debug!(service = %service.id, endpoint, "exchanging stored credential");

        let response = match self
            .http_client
            .post(endpoint)
            .body(record.payload.clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(service = %service.id, error = %e, "token exchange transport error");
                return RefreshOutcome::failed(RefreshErrorKind::Network, e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return RefreshOutcome::failed(
                Self::classify_status(status),
                format!("token endpoint returned {status}: {body}"),
            );
        }

        match response.text().await {
            Ok(payload) if !payload.trim().is_empty() => RefreshOutcome::Renewed { payload },
            Ok(_) => RefreshOutcome::failed(
                RefreshErrorKind::InvalidCredential,
                "token endpoint returned an empty payload",
            ),
            Err(e) => RefreshOutcome::failed(RefreshErrorKind::Network, e.to_string()),
        }
    }
}
