//! Interactive browser-login strategy.
//!
//! Some providers only issue sessions through a real browser login. On
//! an unattended host the only correct move is to report the human step
//! immediately; when attended, a configured helper may drive the login.

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use super::helper::HelperProcessStrategy;
use crate::domain::models::{AuthMechanism, ServiceDefinition, SessionRecord};
use crate::domain::ports::{RefreshOutcome, RefreshStrategy};

pub struct InteractiveBrowserStrategy {
    helper: HelperProcessStrategy,
    unattended: bool,
}

impl InteractiveBrowserStrategy {
    pub const fn new(attempt_timeout: Duration, unattended: bool) -> Self {
        Self {
            helper: HelperProcessStrategy::new(AuthMechanism::InteractiveBrowser, attempt_timeout),
            unattended,
        }
    }
}

#[async_trait]
impl RefreshStrategy for InteractiveBrowserStrategy {
    fn mechanism(&self) -> AuthMechanism {
        AuthMechanism::InteractiveBrowser
    }

    async fn attempt(
        &self,
        service: &ServiceDefinition,
        existing: Option<&SessionRecord>,
    ) -> RefreshOutcome {
        // Never pop a browser on an unattended host.
        if self.unattended {
            info!(service = %service.id, "interactive login deferred to an operator");
            return RefreshOutcome::RequiresInteractiveStep {
                reason: "interactive browser login required".to_string(),
            };
        }

        if service.helper_command.is_empty() {
            return RefreshOutcome::RequiresInteractiveStep {
                reason: "no automated path for an interactive login".to_string(),
            };
        }

        self.helper.attempt(service, existing).await
    }
}
