//! Helper-process strategy.
//!
//! Delegates renewal to a configured external command. The helper
//! receives the current payload on stdin (empty for a first login) and
//! reports its result as one JSON line on stdout:
//!
//! ```json
//! {"outcome": "renewed", "payload": "..."}
//! {"outcome": "interactive_required", "reason": "..."}
//! {"outcome": "failed", "kind": "network", "detail": "..."}
//! ```
//!
//! The last non-empty stdout line is taken as the report; a well-formed
//! report wins over the exit code.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::errors::RefreshErrorKind;
use crate::domain::models::{AuthMechanism, ServiceDefinition, SessionRecord};
use crate::domain::ports::{RefreshOutcome, RefreshStrategy};

/// Wire format of the helper's final stdout line.
#[derive(Debug, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum HelperReport {
    Renewed {
        payload: String,
    },
    InteractiveRequired {
        reason: String,
    },
    Failed {
        kind: RefreshErrorKind,
        #[serde(default)]
        detail: Option<String>,
    },
}

/// Renews sessions by spawning a per-service helper command.
pub struct HelperProcessStrategy {
    mechanism: AuthMechanism,
    attempt_timeout: Duration,
}

impl HelperProcessStrategy {
    pub const fn new(mechanism: AuthMechanism, attempt_timeout: Duration) -> Self {
        Self {
            mechanism,
            attempt_timeout,
        }
    }

    /// Parse the last non-empty stdout line as a report.
    fn parse_report(stdout: &str) -> Option<HelperReport> {
        stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .and_then(|line| serde_json::from_str(line.trim()).ok())
    }

    fn outcome_from_report(report: HelperReport) -> RefreshOutcome {
        match report {
            HelperReport::Renewed { payload } => RefreshOutcome::Renewed { payload },
            HelperReport::InteractiveRequired { reason } => {
                RefreshOutcome::RequiresInteractiveStep { reason }
            }
            HelperReport::Failed { kind, detail } => RefreshOutcome::Failed {
                kind,
                detail: detail.unwrap_or_else(|| "helper reported failure".to_string()),
            },
        }
    }
}

#[async_trait]
impl RefreshStrategy for HelperProcessStrategy {
    fn mechanism(&self) -> AuthMechanism {
        self.mechanism
    }

    async fn attempt(
        &self,
        service: &ServiceDefinition,
        existing: Option<&SessionRecord>,
    ) -> RefreshOutcome {
        let Some((program, args)) = service.helper_command.split_first() else {
            return RefreshOutcome::failed(
                RefreshErrorKind::InvalidCredential,
                "no helper command configured",
            );
        };

        debug!(service = %service.id, helper = %program, "spawning renewal helper");

        let mut child = match Command::new(program)
            .args(args)
            .env("WARDEN_SERVICE", &service.id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return RefreshOutcome::failed(
                    RefreshErrorKind::Network,
                    format!("failed to spawn helper: {e}"),
                );
            }
        };

        // Hand the current payload to the helper, then close stdin so it
        // can tell a first login from a renewal.
        if let Some(mut stdin) = child.stdin.take() {
            if let Some(record) = existing {
                if let Err(e) = stdin.write_all(record.payload.as_bytes()).await {
                    warn!(service = %service.id, error = %e, "failed to write helper stdin");
                }
            }
            drop(stdin);
        }

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let result = timeout(self.attempt_timeout, async {
            let mut output = String::new();
            if let Some(stdout) = stdout {
                let mut reader = BufReader::new(stdout);
                let mut line = String::new();
                while matches!(reader.read_line(&mut line).await, Ok(n) if n > 0) {
                    output.push_str(&line);
                    line.clear();
                }
            }

            let mut errors = String::new();
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr);
                let mut line = String::new();
                while matches!(reader.read_line(&mut line).await, Ok(n) if n > 0) {
                    errors.push_str(&line);
                    line.clear();
                }
            }

            let status = child.wait().await;
            (output, errors, status)
        })
        .await;

        match result {
            Ok((output, errors, status)) => {
                if let Some(report) = Self::parse_report(&output) {
                    return Self::outcome_from_report(report);
                }

                match status {
                    Ok(s) if s.success() => RefreshOutcome::failed(
                        RefreshErrorKind::InvalidCredential,
                        "helper exited without a report",
                    ),
                    Ok(s) => RefreshOutcome::failed(
                        RefreshErrorKind::InvalidCredential,
                        format!("helper exited with {s}: {}", errors.trim()),
                    ),
                    Err(e) => RefreshOutcome::failed(
                        RefreshErrorKind::Network,
                        format!("failed to wait for helper: {e}"),
                    ),
                }
            }
            Err(_) => {
                // Timeout: kill the helper so it cannot linger.
                let _ = child.kill().await;
                warn!(
                    service = %service.id,
                    timeout_secs = self.attempt_timeout.as_secs(),
                    "renewal helper timed out"
                );
                RefreshOutcome::failed(
                    RefreshErrorKind::Network,
                    format!("helper timed out after {}s", self.attempt_timeout.as_secs()),
                )
            }
        }
    }
}
