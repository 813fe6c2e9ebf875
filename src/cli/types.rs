//! CLI type definitions
//!
//! Clap command structures that define the warden CLI surface.

use clap::{Parser, Subcommand};

use super::commands::history::HistoryArgs;
use super::commands::init::InitArgs;
use super::commands::pipeline::RunPipelineArgs;
use super::commands::refresh::RefreshArgs;
use super::commands::status::StatusArgs;

#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Credential and pipeline health warden for unattended batch pipelines", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize warden configuration, database, and stage directories
    Init(InitArgs),

    /// Evaluate pipeline health without changing any state
    CheckStatus(StatusArgs),

    /// Renew the auth session for a single service
    Refresh(RefreshArgs),

    /// Run the full control loop: renewals, extractor hand-off, scoring,
    /// report, notifications
    RunPipeline(RunPipelineArgs),

    /// List recent control-loop runs
    History(HistoryArgs),
}
