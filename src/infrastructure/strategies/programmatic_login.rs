//! Programmatic login strategy.
//!
//! Runs the service's login helper end to end without a human. A helper
//! that demands an interactive step here means the stored credentials no
//! longer support unattended login, which is a permanent failure rather
//! than something to wait on.

use async_trait::async_trait;
use std::time::Duration;

use super::helper::HelperProcessStrategy;
use crate::domain::errors::RefreshErrorKind;
use crate::domain::models::{AuthMechanism, ServiceDefinition, SessionRecord};
use crate::domain::ports::{RefreshOutcome, RefreshStrategy};

pub struct ProgrammaticLoginStrategy {
    helper: HelperProcessStrategy,
}

impl ProgrammaticLoginStrategy {
    pub const fn new(attempt_timeout: Duration) -> Self {
        Self {
            helper: HelperProcessStrategy::new(AuthMechanism::ProgrammaticLogin, attempt_timeout),
        }
    }
}

#[async_trait]
impl RefreshStrategy for ProgrammaticLoginStrategy {
    fn mechanism(&self) -> AuthMechanism {
        AuthMechanism::ProgrammaticLogin
    }

    async fn attempt(
        &self,
        service: &ServiceDefinition,
        existing: Option<&SessionRecord>,
    ) -> RefreshOutcome {
        match self.helper.attempt(service, existing).await {
            RefreshOutcome::RequiresInteractiveStep { reason } => RefreshOutcome::failed(
                RefreshErrorKind::InvalidCredential,
                format!("non-interactive login demanded an interactive step: {reason}"),
            ),
            outcome => outcome,
        }
    }
}
