//! Init command implementation
//!
//! Scaffolds the `.warden/` directory: commented config file, SQLite
//! database with migrations applied, and the pipeline stage directories.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::LoggingConfig;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::Logger;
use crate::infrastructure::setup::{
    create_config_dir, create_config_file, create_pipeline_dirs, run_migrations, SetupPaths,
};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite the config file and database even if they exist
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Serialize)]
struct InitOutput {
    config_file: String,
    database_file: String,
    pipeline_root: String,
    stages: Vec<String>,
    already_initialized: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let headline = if self.already_initialized {
            "Warden is already initialized; existing files were kept. Use --force to overwrite."
        } else {
            "Warden initialized."
        };

        format!(
            "{headline}\n  Config:   {}\n  Database: {}\n  Pipeline: {} ({})\n\nNext: declare your services under `services:` in the config file,\nthen run `warden check-status`.",
            self.config_file,
            self.database_file,
            self.pipeline_root,
            self.stages.join(" -> "),
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<i32> {
    // No config exists yet, so init logs with stock settings.
    let _logger = Logger::init(&LoggingConfig::default())?;

    let paths = SetupPaths::new()?;
    let already_initialized = paths.is_initialized() && !args.force;

    create_config_dir(&paths, args.force)?;
    create_config_file(&paths, args.force)?;
    run_migrations(&paths, args.force).await?;

    // Stage directories follow the merged config, so an operator who
    // already customised the stage list gets their layout.
    let config = ConfigLoader::load()?;
    create_pipeline_dirs(Path::new(&config.pipeline.root), &config.pipeline.stages)?;

    let output_data = InitOutput {
        config_file: paths.config_file.display().to_string(),
        database_file: paths.database_file.display().to_string(),
        pipeline_root: config.pipeline.root,
        stages: config.pipeline.stages,
        already_initialized,
    };

    output(&output_data, json_mode);
    Ok(0)
}
