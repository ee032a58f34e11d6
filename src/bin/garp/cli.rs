//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Garp - deploy static sites over git, rsync, Netlify or Cloudflare Pages
#[derive(Parser)]
#[command(name = "garp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the site using the configured strategy
    Deploy(DeployArgs),

    /// Manage named deployment environments
    #[command(name = "deploy-config")]
    DeployConfig(DeployConfigArgs),

    /// Show recent deployment history
    #[command(name = "deploy-history")]
    DeployHistory(DeployHistoryArgs),

    /// Roll back to a previous deployment
    Rollback(RollbackArgs),

    /// Validate the built site without deploying
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct DeployArgs {
    /// Deployment target (git, rsync, netlify, cloudflare)
    #[arg(long, default_value = "git")]
    pub target: String,

    /// Show what would be deployed without actually deploying
    #[arg(long)]
    pub dry_run: bool,

    /// Run the build before deployment
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub build: bool,

    /// Skip connection validation (SSH / API probes)
    #[arg(long)]
    pub skip_validation: bool,

    /// Skip content validation
    #[arg(long)]
    pub skip_content_check: bool,

    /// Built site directory to deploy
    #[arg(long, default_value = "site")]
    pub source_dir: PathBuf,

    /// Git remote for deployment
    #[arg(long, default_value = "origin")]
    pub git_remote: String,

    /// Git branch for deployment (defaults to the current branch)
    #[arg(long)]
    pub git_branch: Option<String>,

    /// Rsync target host
    #[arg(long)]
    pub rsync_host: Option<String>,

    /// Rsync user
    #[arg(long)]
    pub rsync_user: Option<String>,

    /// Rsync target path
    #[arg(long)]
    pub rsync_path: Option<String>,

    /// Additional rsync exclude pattern (repeatable)
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,

    /// API key for the hosted platform
    #[arg(long, env = "GARP_API_KEY")]
    pub api_key: Option<String>,

    /// Project/account ID for the hosted platform
    #[arg(long)]
    pub project_id: Option<String>,

    /// Site ID for the hosted platform
    #[arg(long)]
    pub site_id: Option<String>,
}

#[derive(Args)]
pub struct DeployConfigArgs {
    #[command(subcommand)]
    pub command: DeployConfigCommands,
}

#[derive(Subcommand)]
pub enum DeployConfigCommands {
    /// Set deployment configuration for an environment
    Set(SetConfigArgs),

    /// Show deployment configuration for an environment
    Get(GetConfigArgs),

    /// List all configured environments
    List,

    /// Remove deployment configuration for an environment
    Remove(RemoveConfigArgs),
}

#[derive(Args)]
pub struct SetConfigArgs {
    /// Environment name (e.g. staging, production)
    pub name: String,

    /// Deployment strategy (git, rsync, netlify, cloudflare)
    #[arg(long)]
    pub strategy: String,

    /// Configuration value as key=value (repeatable)
    #[arg(long = "config")]
    pub values: Vec<String>,
}

#[derive(Args)]
pub struct GetConfigArgs {
    /// Environment name
    pub name: String,
}

#[derive(Args)]
pub struct RemoveConfigArgs {
    /// Environment name
    pub name: String,
}

#[derive(Args)]
pub struct DeployHistoryArgs {
    /// Number of recent deployments to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Args)]
pub struct RollbackArgs {
    /// Deployment ID to roll back to (defaults to the last successful one)
    pub deployment_id: Option<String>,

    /// Show what would be rolled back without doing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Built site directory to validate
    #[arg(long, default_value = "site")]
    pub source_dir: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
