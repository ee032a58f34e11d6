//! Garp CLI - static-site deployment tool

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("garp=debug")
    } else {
        EnvFilter::new("garp=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Deploy(args) => commands::deploy::execute(args, cli.verbose),
        Commands::DeployConfig(args) => commands::deploy_config::execute(args),
        Commands::DeployHistory(args) => commands::deploy_history::execute(args),
        Commands::Rollback(args) => commands::rollback::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
