//! Domain errors for the warden control loop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed renewal attempt.
///
/// Drives retry behavior: only transient kinds are retried within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshErrorKind {
    /// The provider explicitly rejected the stored credential.
    InvalidCredential,
    /// Connectivity loss, timeout, or a provider-side failure.
    Network,
    /// The run was aborted while the attempt was in flight.
    Cancelled,
}

impl RefreshErrorKind {
    /// Whether an in-run retry with backoff is worthwhile.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid_credential",
            Self::Network => "network",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "invalid_credential" => Some(Self::InvalidCredential),
            "network" => Some(Self::Network),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for RefreshErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level errors for the warden system.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Service not found in registry: {0}")]
    ServiceNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Refresh failed for {service}: {kind}: {detail}")]
    RefreshFailed {
        service: String,
        kind: RefreshErrorKind,
        detail: String,
    },

    #[error("Notification delivery failed: {0}")]
    NotificationFailed(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Run aborted")]
    Aborted,
}

pub type WardenResult<T> = Result<T, WardenError>;

impl From<sqlx::Error> for WardenError {
    fn from(err: sqlx::Error) -> Self {
        WardenError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        WardenError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        WardenError::Storage(err.to_string())
    }
}
