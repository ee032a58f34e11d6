//! Git deployment backend.
//!
//! Deploys by pushing the current repository to a configured remote,
//! for setups where the remote side (a host with a post-receive hook,
//! or a connected hosting platform) publishes on push.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::deploy::config::{DeploymentConfig, DeploymentResult, Strategy};
use crate::deploy::error::DeployError;
use crate::deploy::Deployer;
use crate::util::process::{combined_output, find_executable, ProcessBuilder};

/// Git-based deployment.
#[derive(Debug, Default)]
pub struct GitDeployer;

impl GitDeployer {
    pub fn new() -> Self {
        GitDeployer
    }
}

impl Deployer for GitDeployer {
    fn name(&self) -> &'static str {
        "Git"
    }

    fn validate(&self, config: &DeploymentConfig) -> Result<(), DeployError> {
        if find_executable("git").is_none() {
            return Err(DeployError::External(
                "git command not found - install git and ensure it is on PATH".to_string(),
            ));
        }

        let cwd = Path::new(".");

        if !is_git_repository(cwd) {
            return Err(DeployError::Validation("not in a git repository".to_string()));
        }

        if has_uncommitted_changes(cwd) {
            return Err(DeployError::Validation(
                "uncommitted changes detected - commit or stash changes before deploying"
                    .to_string(),
            ));
        }

        let remote = config.git_remote_or_default();
        if !remote_exists(cwd, remote) {
            return Err(DeployError::Config(format!(
                "git remote '{remote}' does not exist"
            )));
        }

        Ok(())
    }

    fn deploy(&self, config: &DeploymentConfig) -> Result<DeploymentResult, DeployError> {
        let mut result = DeploymentResult::for_strategy(Strategy::Git);
        let start = Instant::now();

        info!(
            "starting git deployment to remote '{}'",
            config.git_remote_or_default()
        );

        if let Err(err) = self.validate(config) {
            result.duration = start.elapsed();
            return Err(DeployError::failed(result, err.to_string()));
        }

        let remote = config.git_remote_or_default().to_string();
        let branch = match config.git_branch.as_deref() {
            Some(branch) if !branch.is_empty() => branch.to_string(),
            _ => match current_branch(Path::new(".")) {
                Some(branch) => branch,
                None => {
                    result.duration = start.elapsed();
                    return Err(DeployError::failed(
                        result,
                        "failed to determine current git branch",
                    ));
                }
            },
        };

        if config.dry_run {
            result.messages.push(format!("Would push to {remote}/{branch}"));
            result.success = true;
            result.duration = start.elapsed();
            return Ok(result);
        }

        debug!("executing: git push {remote} {branch}");

        let output = match ProcessBuilder::new("git")
            .args(["push", remote.as_str(), branch.as_str()])
            .exec()
        {
            Ok(output) => output,
            Err(err) => {
                result.duration = start.elapsed();
                return Err(DeployError::failed(result, format!("git push failed: {err}")));
            }
        };

        if !output.status.success() {
            result.duration = start.elapsed();
            return Err(DeployError::failed(
                result,
                format!("git push failed:\n{}", combined_output(&output)),
            ));
        }

        result
            .messages
            .push(format!("Successfully pushed to {remote}/{branch}"));
        result.success = true;
        result.duration = start.elapsed();

        info!("git deployment completed in {:?}", result.duration);
        Ok(result)
    }
}

fn is_git_repository(dir: &Path) -> bool {
    ProcessBuilder::new("git")
        .args(["rev-parse", "--git-dir"])
        .cwd(dir)
        .succeeds()
}

fn has_uncommitted_changes(dir: &Path) -> bool {
    match ProcessBuilder::new("git")
        .args(["status", "--porcelain"])
        .cwd(dir)
        .exec()
    {
        Ok(output) if output.status.success() => {
            !String::from_utf8_lossy(&output.stdout).trim().is_empty()
        }
        // Assume dirty when the check itself fails.
        _ => true,
    }
}

fn remote_exists(dir: &Path, remote: &str) -> bool {
    ProcessBuilder::new("git")
        .args(["remote", "get-url", remote])
        .cwd(dir)
        .succeeds()
}

/// Name of the currently checked-out branch, best-effort.
pub fn current_branch(dir: &Path) -> Option<String> {
    let branch = ProcessBuilder::new("git")
        .args(["branch", "--show-current"])
        .cwd(dir)
        .exec_stdout()
        .ok()?;
    (!branch.is_empty()).then_some(branch)
}

/// Short hash of `HEAD`, best-effort.
pub fn current_commit(dir: &Path) -> Option<String> {
    let commit = ProcessBuilder::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .cwd(dir)
        .exec_stdout()
        .ok()?;
    (!commit.is_empty()).then_some(commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo(dir: &Path) {
        ProcessBuilder::new("git")
            .args(["init", "--initial-branch=main"])
            .cwd(dir)
            .exec_and_check()
            .unwrap();
        ProcessBuilder::new("git")
            .args(["config", "user.email", "test@example.com"])
            .cwd(dir)
            .exec_and_check()
            .unwrap();
        ProcessBuilder::new("git")
            .args(["config", "user.name", "Test"])
            .cwd(dir)
            .exec_and_check()
            .unwrap();
    }

    #[test]
    fn test_not_a_repository() {
        let tmp = TempDir::new().unwrap();
        assert!(!is_git_repository(tmp.path()));
        assert!(current_branch(tmp.path()).is_none());
        assert!(current_commit(tmp.path()).is_none());
    }

    #[test]
    fn test_branch_and_commit_capture() {
        if find_executable("git").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());

        std::fs::write(tmp.path().join("index.html"), "<html></html>").unwrap();
        ProcessBuilder::new("git")
            .args(["add", "."])
            .cwd(tmp.path())
            .exec_and_check()
            .unwrap();
        ProcessBuilder::new("git")
            .args(["commit", "-m", "initial"])
            .cwd(tmp.path())
            .exec_and_check()
            .unwrap();

        assert_eq!(current_branch(tmp.path()).as_deref(), Some("main"));
        assert!(current_commit(tmp.path()).is_some());
        assert!(!has_uncommitted_changes(tmp.path()));
    }

    #[test]
    fn test_uncommitted_changes_detected() {
        if find_executable("git").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());

        std::fs::write(tmp.path().join("untracked.txt"), "dirty").unwrap();
        assert!(has_uncommitted_changes(tmp.path()));
    }

    #[test]
    fn test_missing_remote() {
        if find_executable("git").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        init_repo(tmp.path());
        assert!(!remote_exists(tmp.path(), "origin"));
    }
}
