//! Refresh command implementation
//!
//! Renews the session for one named service under its own run record.
//! Unlike the bulk pass, an operator-initiated refresh also attempts
//! services whose renewal is suspended pending an interactive step.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::{watch_interrupts, AppContext};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{OutcomeKind, ServiceOutcome};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::Logger;

#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Service to renew
    #[arg(short, long)]
    pub service: String,

    /// Renew even if the session is still fresh
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Serialize)]
struct RefreshOutput {
    service_id: String,
    outcome: String,
    detail: Option<String>,
}

impl RefreshOutput {
    fn from_outcome(outcome: &ServiceOutcome) -> Self {
        Self {
            service_id: outcome.service_id.clone(),
            outcome: outcome.outcome.as_str().to_string(),
            detail: outcome.detail.clone(),
        }
    }
}

impl CommandOutput for RefreshOutput {
    fn to_human(&self) -> String {
        let detail = self.detail.as_deref().unwrap_or("no detail");
        match self.outcome.as_str() {
            "renewed" => format!("Session for {} renewed.", self.service_id),
            "fresh" => format!(
                "Session for {} is still fresh; nothing to do. Use --force to renew anyway.",
                self.service_id
            ),
            "blocked_on_human" => format!(
                "Renewal for {} needs an operator step: {detail}\nComplete it, then run: warden refresh --service {}",
                self.service_id, self.service_id
            ),
            "skipped" => format!("Renewal for {} was skipped: {detail}", self.service_id),
            "cancelled" => format!(
                "Renewal for {} was cancelled before completing; nothing was written.",
                self.service_id
            ),
            "storage_error" => format!(
                "Session state for {} could not be read or written: {detail}",
                self.service_id
            ),
            _ => format!("Renewal for {} failed: {detail}", self.service_id),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RefreshArgs, json_mode: bool) -> Result<i32> {
    let config = ConfigLoader::load()?;
    let _logger = Logger::init(&config.logging)?;
    let ctx = AppContext::build(config).await?;
    watch_interrupts(ctx.runner.abort_handle());

    let outcome = ctx.runner.refresh_service(&args.service, args.force).await?;
    let exit_code = match outcome.outcome {
        OutcomeKind::Renewed | OutcomeKind::Fresh => 0,
        _ => 1,
    };

    output(&RefreshOutput::from_outcome(&outcome), json_mode);
    ctx.shutdown().await;
    Ok(exit_code)
}
