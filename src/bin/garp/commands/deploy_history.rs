//! `garp deploy-history` command

use anyhow::Result;

use crate::cli::DeployHistoryArgs;
use garp::deploy::HistoryStore;
use garp::util::ProjectContext;

pub fn execute(args: DeployHistoryArgs) -> Result<()> {
    let ctx = ProjectContext::new()?;
    let history = HistoryStore::open(&ctx)?;

    let recent = history.recent(args.limit);
    if recent.is_empty() {
        println!("No deployments found.");
        return Ok(());
    }

    println!("Recent deployments (showing {}):\n", recent.len());

    for record in recent {
        let status = if record.success { "SUCCESS" } else { "FAILED" };

        println!("ID: {}", record.id);
        println!("Time: {}", record.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("Strategy: {}", record.strategy);
        if !record.target.is_empty() {
            println!("Target: {}", record.target);
        }
        println!("Status: {status}");
        println!("Duration: {}s", record.duration_secs);

        if let Some(url) = &record.url {
            println!("URL: {url}");
        }
        if let Some(branch) = &record.git_branch {
            println!("Git Branch: {branch}");
        }
        if let Some(commit) = &record.git_commit {
            println!("Git Commit: {commit}");
        }

        if !record.messages.is_empty() {
            println!("Messages:");
            for msg in &record.messages {
                println!("  - {msg}");
            }
        }

        if !record.errors.is_empty() {
            println!("Errors:");
            for err in &record.errors {
                println!("  - {err}");
            }
        }

        println!();
    }

    Ok(())
}
