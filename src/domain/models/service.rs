//! Service registry definitions.
//!
//! A [`ServiceDefinition`] describes one external data source: how its
//! session is renewed, how long a credential lives, and how its pipeline
//! artifacts are recognized. Definitions are loaded once from
//! configuration and never mutated at runtime.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Authentication mechanism backing a service's session renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMechanism {
    /// Mint a short-lived credential from a stored long-lived one.
    SilentExchange,
    /// Re-authenticate with stored non-interactive credentials.
    ProgrammaticLogin,
    /// Drive a browser session; may demand a human-mediated step.
    InteractiveBrowser,
}

impl AuthMechanism {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SilentExchange => "silent_exchange",
            Self::ProgrammaticLogin => "programmatic_login",
            Self::InteractiveBrowser => "interactive_browser",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "silent_exchange" => Some(Self::SilentExchange),
            "programmatic_login" => Some(Self::ProgrammaticLogin),
            "interactive_browser" => Some(Self::InteractiveBrowser),
            _ => None,
        }
    }
}

/// Operator-facing priority of a service.
///
/// Controls refresh ordering and how much a service's health tier
/// weighs on the pipeline verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl PriorityClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Scheduling rank; lower runs first.
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Whether this service's tier carries full weight in the verdict.
    pub const fn weighs_full(&self) -> bool {
        !matches!(self, Self::Low)
    }
}

/// Immutable definition of one external service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceDefinition {
    /// Unique service identifier, e.g. "spotify".
    pub id: String,

    /// Renewal mechanism for this service.
    pub mechanism: AuthMechanism,

    /// Hard credential lifetime in days.
    pub max_age_days: i64,

    /// How long before hard expiry renewal should begin, in days.
    /// Must be strictly less than `max_age_days`.
    pub renewal_interval_days: i64,

    /// Whether renewal may demand a human-mediated step.
    #[serde(default)]
    pub interactive: bool,

    /// Verdict weighting and scheduling class.
    #[serde(default)]
    pub priority: PriorityClass,

    /// Age in days beyond which a stage artifact counts as stale.
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,

    /// Helper command (argv form) for login-based mechanisms.
    #[serde(default)]
    pub helper_command: Vec<String>,

    /// Extractor command (argv form) run during the pipeline hand-off.
    #[serde(default)]
    pub extractor_command: Vec<String>,

    /// Extra filename fragments identifying this service's artifacts.
    /// The service id itself always matches.
    #[serde(default)]
    pub file_hints: Vec<String>,

    /// Token endpoint for the silent-exchange mechanism.
    #[serde(default)]
    pub token_endpoint: Option<String>,
}

const fn default_stale_after_days() -> i64 {
    7
}

impl ServiceDefinition {
    /// Hard credential lifetime.
    pub fn max_age(&self) -> Duration {
        Duration::days(self.max_age_days)
    }

    /// Renewal lead time before hard expiry.
    pub fn renewal_interval(&self) -> Duration {
        Duration::days(self.renewal_interval_days)
    }

    /// All lowercase filename fragments used to match artifacts.
    pub fn artifact_hints(&self) -> Vec<String> {
        let mut hints = vec![self.id.to_lowercase()];
        for hint in &self.file_hints {
            let lowered = hint.to_lowercase();
            if !hints.contains(&lowered) {
                hints.push(lowered);
            }
        }
        hints
    }
}
