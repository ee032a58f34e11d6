//! Rsync deployment backend.
//!
//! Syncs the built site to a remote host over SSH with `rsync -avz
//! --progress --delete`, excluding VCS droppings and local-only files.

use std::time::Instant;

use tracing::{debug, info};

use crate::deploy::config::{DeploymentConfig, DeploymentResult, Strategy};
use crate::deploy::error::DeployError;
use crate::deploy::{Deployer, PROBE_TIMEOUT};
use crate::util::process::{combined_output, find_executable, ProcessBuilder};

/// Files never shipped to the remote, regardless of caller excludes.
const DEFAULT_EXCLUDES: &[&str] = &[".git/", ".DS_Store", ".env", "*.log"];

/// Rsync-based deployment.
#[derive(Debug, Default)]
pub struct RsyncDeployer;

impl RsyncDeployer {
    pub fn new() -> Self {
        RsyncDeployer
    }
}

impl Deployer for RsyncDeployer {
    fn name(&self) -> &'static str {
        "Rsync"
    }

    fn validate(&self, config: &DeploymentConfig) -> Result<(), DeployError> {
        if find_executable("rsync").is_none() {
            return Err(DeployError::External(
                "rsync command not found - install rsync and ensure it is on PATH".to_string(),
            ));
        }

        if config.rsync_host.is_empty() {
            return Err(DeployError::Config("rsync host is required".to_string()));
        }

        if config.rsync_path.is_empty() {
            return Err(DeployError::Config("rsync path is required".to_string()));
        }

        if !config.source_dir.is_dir() {
            return Err(DeployError::Filesystem {
                path: config.source_dir.clone(),
                message: "source directory does not exist - run the build first".to_string(),
            });
        }

        if let Some(user) = config.rsync_user.as_deref() {
            if !user.is_empty() && !config.skip_validation {
                let target = format!("{}@{}", user, config.rsync_host);
                test_ssh_connection(&target)?;
            }
        }

        Ok(())
    }

    fn deploy(&self, config: &DeploymentConfig) -> Result<DeploymentResult, DeployError> {
        let mut result = DeploymentResult::for_strategy(Strategy::Rsync);
        let start = Instant::now();

        info!("starting rsync deployment to {}", config.rsync_host);

        if let Err(err) = self.validate(config) {
            result.duration = start.elapsed();
            return Err(DeployError::failed(result, err.to_string()));
        }

        let destination = config.rsync_destination();

        if config.dry_run {
            result
                .messages
                .push(format!("Would sync {} to {destination}", config.source_dir.display()));
            result.success = true;
            result.duration = start.elapsed();
            return Ok(result);
        }

        let mut args: Vec<String> = vec![
            "-avz".to_string(),
            "--progress".to_string(),
            "--delete".to_string(),
        ];

        for exclude in DEFAULT_EXCLUDES
            .iter()
            .map(|e| e.to_string())
            .chain(config.rsync_excludes.iter().cloned())
        {
            args.push("--exclude".to_string());
            args.push(exclude);
        }

        // Trailing slash: sync the directory contents, not the directory.
        args.push(format!("{}/", config.source_dir.display()));
        args.push(destination.clone());

        let rsync = ProcessBuilder::new("rsync").args(&args);
        debug!("executing: {}", rsync.display_command());

        if config.verbose {
            // Stream --progress output straight to the terminal.
            match rsync.status() {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    result.duration = start.elapsed();
                    return Err(DeployError::failed(
                        result,
                        format!("rsync failed with exit code {:?}", status.code()),
                    ));
                }
                Err(err) => {
                    result.duration = start.elapsed();
                    return Err(DeployError::failed(result, format!("rsync failed: {err}")));
                }
            }
        } else {
            match rsync.exec() {
                Ok(output) if output.status.success() => {}
                Ok(output) => {
                    result.duration = start.elapsed();
                    return Err(DeployError::failed(
                        result,
                        format!("rsync failed:\n{}", combined_output(&output)),
                    ));
                }
                Err(err) => {
                    result.duration = start.elapsed();
                    return Err(DeployError::failed(result, format!("rsync failed: {err}")));
                }
            }
        }

        result
            .messages
            .push(format!("Successfully synced to {destination}"));
        result.success = true;
        result.duration = start.elapsed();

        info!("rsync deployment completed in {:?}", result.duration);
        Ok(result)
    }
}

/// Probe the SSH endpoint without any interactive prompting.
fn test_ssh_connection(target: &str) -> Result<(), DeployError> {
    let connect_timeout = format!("ConnectTimeout={}", PROBE_TIMEOUT.as_secs());

    let output = ProcessBuilder::new("ssh")
        .args([
            "-o",
            connect_timeout.as_str(),
            "-o",
            "BatchMode=yes",
            target,
            "true",
        ])
        .exec()
        .map_err(|e| DeployError::External(format!("SSH connection test failed: {e}")))?;

    if !output.status.success() {
        return Err(DeployError::External(format!(
            "SSH connection test to {target} failed:\n{}",
            combined_output(&output)
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(tmp: &TempDir) -> DeploymentConfig {
        DeploymentConfig {
            strategy: Strategy::Rsync,
            rsync_host: "example.com".into(),
            rsync_path: "/var/www".into(),
            source_dir: tmp.path().join("site"),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_requires_host_and_path() {
        if find_executable("rsync").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("site")).unwrap();

        let mut config = config_for(&tmp);
        config.rsync_host = String::new();
        let err = RsyncDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("host"));

        let mut config = config_for(&tmp);
        config.rsync_path = String::new();
        let err = RsyncDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_validate_requires_source_dir() {
        if find_executable("rsync").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp);

        let err = RsyncDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("source directory"));
    }

    #[test]
    fn test_dry_run_reports_destination_without_syncing() {
        if find_executable("rsync").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("site")).unwrap();

        let mut config = config_for(&tmp);
        config.dry_run = true;

        let result = RsyncDeployer::new().deploy(&config).unwrap();
        assert!(result.success);
        assert!(result.messages[0].contains("/var/www"));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_deploy_failure_carries_result() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp);

        let err = RsyncDeployer::new().deploy(&config).unwrap_err();
        let result = err.result().expect("failed deploy carries a result");
        assert!(!result.success);
        assert!(!result.errors.is_empty());
    }
}
