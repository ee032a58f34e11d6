//! `garp deploy-config` command
//!
//! Manages named deployment environment profiles (staging, production).

use anyhow::{Context, Result};

use crate::cli::{DeployConfigArgs, DeployConfigCommands, SetConfigArgs};
use garp::deploy::{EnvironmentConfig, EnvironmentStore, Strategy};
use garp::util::ProjectContext;

pub fn execute(args: DeployConfigArgs) -> Result<()> {
    let ctx = ProjectContext::new()?;
    let mut store = EnvironmentStore::open(&ctx)?;

    match args.command {
        DeployConfigCommands::Set(set_args) => set(&mut store, set_args),
        DeployConfigCommands::Get(get_args) => {
            let config = store.get_environment(&get_args.name)?;

            println!("Environment: {}", config.name);
            println!("Strategy: {}", config.strategy);
            if !config.config.is_empty() {
                println!("Configuration:");
                for (key, value) in &config.config {
                    println!("  {key}: {value}");
                }
            }
            Ok(())
        }
        DeployConfigCommands::List => {
            let environments = store.list_environments();
            if environments.is_empty() {
                println!("No deployment configurations found.");
                return Ok(());
            }

            println!("Configured environments:");
            for name in environments {
                match store.get_environment(&name) {
                    Ok(config) => println!("  {name} ({})", config.strategy),
                    Err(_) => println!("  {name}"),
                }
            }
            Ok(())
        }
        DeployConfigCommands::Remove(remove_args) => {
            store.remove_environment(&remove_args.name)?;
            println!("Configuration removed for environment '{}'", remove_args.name);
            Ok(())
        }
    }
}

fn set(store: &mut EnvironmentStore, args: SetConfigArgs) -> Result<()> {
    // Catch strategy typos before they end up on disk.
    args.strategy
        .parse::<Strategy>()
        .context("invalid --strategy value")?;

    let mut config = EnvironmentConfig {
        name: String::new(),
        strategy: args.strategy,
        config: Default::default(),
    };

    for pair in &args.values {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("invalid --config value '{pair}' (expected key=value)"))?;
        config.config.insert(key.to_string(), value.to_string());
    }

    store.set_environment(&args.name, config)?;
    println!("Configuration saved for environment '{}'", args.name);
    Ok(())
}
