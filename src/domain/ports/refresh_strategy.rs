//! Refresh strategy port.

use async_trait::async_trait;

use crate::domain::errors::RefreshErrorKind;
use crate::domain::models::{AuthMechanism, ServiceDefinition, SessionRecord};

/// Result of one renewal attempt.
///
/// `RequiresInteractiveStep` is an outcome, not an error: the provider
/// demands a human action that automation must not bypass.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A new opaque credential payload was obtained.
    Renewed { payload: String },
    /// A human must complete a provider-mandated step out-of-band.
    RequiresInteractiveStep { reason: String },
    /// The attempt failed.
    Failed {
        kind: RefreshErrorKind,
        detail: String,
    },
}

impl RefreshOutcome {
    pub fn failed(kind: RefreshErrorKind, detail: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            detail: detail.into(),
        }
    }
}

/// One renewal mechanism.
///
/// Implementations must be idempotent: a repeated `attempt` after a
/// `Renewed` outcome must not corrupt state. The orchestrator guarantees
/// this holds at the store level by always overwriting, never merging.
#[async_trait]
pub trait RefreshStrategy: Send + Sync {
    /// The mechanism this strategy implements.
    fn mechanism(&self) -> AuthMechanism;

    /// Attempt to renew the service's session.
    ///
    /// All network and process work carries an explicit timeout; a
    /// timeout surfaces as `Failed` with a transient kind.
    async fn attempt(
        &self,
        service: &ServiceDefinition,
        existing: Option<&SessionRecord>,
    ) -> RefreshOutcome;
}
