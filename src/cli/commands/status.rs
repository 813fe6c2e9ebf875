//! Check-status command implementation
//!
//! Evaluates session classification, stage freshness, and scoring
//! without renewing anything or writing any state. The process exit
//! code carries the verdict so cron wrappers can gate on it.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::HealthReport;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::Logger;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Restrict the report to one service
    #[arg(short, long)]
    pub service: Option<String>,
}

#[derive(Serialize)]
struct StatusOutput {
    report: HealthReport,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_report(&self.report)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.report).unwrap_or_default()
    }
}

pub async fn execute(args: StatusArgs, json_mode: bool) -> Result<i32> {
    let config = ConfigLoader::load()?;
    let _logger = Logger::init(&config.logging)?;
    let ctx = AppContext::build(config).await?;

    let report = ctx.runner.check_status(args.service.as_deref()).await?;
    let exit_code = i32::from(report.exit_code());

    output(&StatusOutput { report }, json_mode);
    ctx.shutdown().await;
    Ok(exit_code)
}
