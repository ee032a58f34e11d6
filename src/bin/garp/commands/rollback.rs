//! `garp rollback` command
//!
//! Resolves a past deployment and prints the manual steps to return to
//! it. Rollback is never executed automatically: reverting a live site
//! safely needs a human in the loop.

use anyhow::{bail, Context, Result};

use crate::cli::RollbackArgs;
use garp::deploy::{DeploymentRecord, HistoryStore};
use garp::util::ProjectContext;

pub fn execute(args: RollbackArgs) -> Result<()> {
    let ctx = ProjectContext::new()?;
    let history = HistoryStore::open(&ctx)?;

    let target: &DeploymentRecord = match args.deployment_id.as_deref() {
        Some(id) => history.by_id(id).context("deployment not found")?,
        None => history
            .latest_successful()
            .context("no successful deployment found")?,
    };

    if !target.success {
        bail!("cannot roll back to failed deployment {}", target.id);
    }

    println!("Rolling back to deployment {}", target.id);
    println!(
        "Target: {} ({})",
        target.strategy,
        target.timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    if args.dry_run {
        println!("Dry run - no rollback will be performed");
        return Ok(());
    }

    if target.strategy == "git" {
        let commit = target
            .git_commit
            .as_deref()
            .context("no git commit information available for rollback")?;

        println!("Git rollback requires manual intervention:");
        println!("  1. git checkout {commit}");
        println!("  2. Review the changes");
        println!("  3. Create a new commit or force push if appropriate");
        println!("  4. Run 'garp deploy' to deploy the rolled-back version");
        return Ok(());
    }

    println!("Automatic rollback is not supported for the {} strategy.", target.strategy);
    println!("Suggested action: revert your changes and run 'garp deploy' again");

    Ok(())
}
