//! History command implementation
//!
//! Lists recent control-loop runs with their outcome counters, newest
//! first.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::RunRecord;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::Logger;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of runs to display
    #[arg(short, long, default_value = "20")]
    pub limit: u32,
}

#[derive(Serialize)]
struct HistoryOutput {
    runs: Vec<RunRecord>,
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        if self.runs.is_empty() {
            return "No runs recorded yet. Run `warden run-pipeline` to start.".to_string();
        }
        TableFormatter::new().format_runs(&self.runs)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.runs).unwrap_or_default()
    }
}

pub async fn execute(args: HistoryArgs, json_mode: bool) -> Result<i32> {
    let config = ConfigLoader::load()?;
    let _logger = Logger::init(&config.logging)?;
    let ctx = AppContext::build(config).await?;

    let runs = ctx.runner.recent_runs(args.limit).await?;

    output(&HistoryOutput { runs }, json_mode);
    ctx.shutdown().await;
    Ok(0)
}
