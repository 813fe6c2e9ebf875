//! Run-pipeline command implementation
//!
//! The full control loop: refresh pass, extractor hand-off, freshness
//! inspection, scoring, report persistence, and notifications. Exit
//! code carries the final verdict.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::PipelineOptions;
use crate::cli::context::{watch_interrupts, AppContext};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::HealthReport;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::Logger;

#[derive(Args, Debug)]
pub struct RunPipelineArgs {
    /// Renew sessions but do not run extractor commands
    #[arg(long)]
    pub skip_extractors: bool,

    /// Re-run the extractor once for services with stale stages and a
    /// usable session
    #[arg(long)]
    pub auto_remediate: bool,
}

#[derive(Serialize)]
struct RunPipelineOutput {
    report: HealthReport,
}

impl CommandOutput for RunPipelineOutput {
    fn to_human(&self) -> String {
        TableFormatter::new().format_report(&self.report)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.report).unwrap_or_default()
    }
}

pub async fn execute(args: RunPipelineArgs, json_mode: bool) -> Result<i32> {
    let config = ConfigLoader::load()?;
    let _logger = Logger::init(&config.logging)?;
    let ctx = AppContext::build(config).await?;
    watch_interrupts(ctx.runner.abort_handle());

    let options = PipelineOptions {
        skip_extractors: args.skip_extractors,
        auto_remediate: args.auto_remediate,
    };
    let report = ctx.runner.run(options).await?;
    let exit_code = i32::from(report.exit_code());

    output(&RunPipelineOutput { report }, json_mode);
    ctx.shutdown().await;
    Ok(exit_code)
}
