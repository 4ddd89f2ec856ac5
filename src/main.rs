// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Run { stage, manifest } => commands::cmd_run(&stage, manifest),
        Commands::Plan { stage } => commands::cmd_plan(&stage),
        Commands::Recover { stage } => commands::cmd_recover(&stage),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
