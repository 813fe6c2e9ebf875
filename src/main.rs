//! Warden CLI entry point.

use clap::Parser;

use warden::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => warden::cli::commands::init::execute(args, cli.json).await,
        Commands::CheckStatus(args) => warden::cli::commands::status::execute(args, cli.json).await,
        Commands::Refresh(args) => warden::cli::commands::refresh::execute(args, cli.json).await,
        Commands::RunPipeline(args) => {
            warden::cli::commands::pipeline::execute(args, cli.json).await
        }
        Commands::History(args) => warden::cli::commands::history::execute(args, cli.json).await,
    };

    // Commands map the health verdict to the exit code (0 healthy,
    // 1 degraded, 2 critical); operational failures exit 1.
    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            handle_error(&err, cli.json);
            std::process::exit(1);
        }
    }
}

fn handle_error(err: &anyhow::Error, json_mode: bool) {
    if json_mode {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": chain.first(), "chain": chain });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("Error: {err:#}");
    }
}
