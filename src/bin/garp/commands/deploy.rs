//! `garp deploy` command

use anyhow::{Context, Result};

use crate::cli::DeployArgs;
use garp::build::ShellBuildRunner;
use garp::deploy::{DeploymentConfig, Manager, Strategy};
use garp::util::ProjectContext;

pub fn execute(args: DeployArgs, verbose: bool) -> Result<()> {
    let strategy: Strategy = args
        .target
        .parse()
        .context("invalid deployment target")?;

    let config = DeploymentConfig {
        strategy,
        target: args.target,
        dry_run: args.dry_run,
        verbose,
        build_first: args.build,
        skip_validation: args.skip_validation,
        skip_content_check: args.skip_content_check,
        source_dir: args.source_dir,
        git_remote: args.git_remote,
        git_branch: args.git_branch,
        rsync_host: args.rsync_host.unwrap_or_default(),
        rsync_user: args.rsync_user,
        rsync_path: args.rsync_path.unwrap_or_default(),
        rsync_excludes: args.excludes,
        api_key: args.api_key.unwrap_or_default(),
        project_id: args.project_id.unwrap_or_default(),
        site_id: args.site_id.unwrap_or_default(),
    };

    let ctx = ProjectContext::new()?;
    let manager = Manager::new(ctx).with_builder(Box::new(ShellBuildRunner::from_env()));

    manager
        .validate(&config)
        .context("deployment validation failed")?;

    println!("Starting deployment using {strategy} strategy");

    match manager.deploy(&config) {
        Ok(result) => {
            println!(
                "Deployment completed successfully in {:.1}s",
                result.duration.as_secs_f64()
            );
            if result.build_executed {
                println!("  build executed");
            }
            for msg in &result.messages {
                println!("  {msg}");
            }
            if let Some(url) = &result.url {
                println!("  URL: {url}");
            }
            Ok(())
        }
        Err(err) => {
            if let Some(result) = err.result() {
                eprintln!(
                    "Deployment failed after {:.1}s",
                    result.duration.as_secs_f64()
                );
                for e in &result.errors {
                    eprintln!("  error: {e}");
                }
            }
            Err(err.into())
        }
    }
}
