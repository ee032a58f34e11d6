//! Deployment manager.
//!
//! The single entry point for deployments: resolves the backend for the
//! selected strategy, optionally triggers a build, gates on content
//! validation, dispatches the transfer, and records the outcome in the
//! deployment history.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::build::BuildRunner;
use crate::deploy::config::{DeploymentConfig, DeploymentResult, Strategy};
use crate::deploy::error::DeployError;
use crate::deploy::history::HistoryStore;
use crate::deploy::validation::{default_validation_options, validate_deployment, IssueKind};
use crate::deploy::{
    CloudflareDeployer, Deployer, GitDeployer, NetlifyDeployer, RsyncDeployer,
};
use crate::util::context::ProjectContext;

/// Coordinates deployment operations.
pub struct Manager {
    ctx: ProjectContext,
    deployers: BTreeMap<Strategy, Box<dyn Deployer>>,
    builder: Option<Box<dyn BuildRunner>>,
}

impl Manager {
    /// A manager with all four backends registered.
    pub fn new(ctx: ProjectContext) -> Self {
        let mut deployers: BTreeMap<Strategy, Box<dyn Deployer>> = BTreeMap::new();
        deployers.insert(Strategy::Git, Box::new(GitDeployer::new()));
        deployers.insert(Strategy::Rsync, Box::new(RsyncDeployer::new()));
        deployers.insert(Strategy::Netlify, Box::new(NetlifyDeployer::new()));
        deployers.insert(Strategy::Cloudflare, Box::new(CloudflareDeployer::new()));

        Manager {
            ctx,
            deployers,
            builder: None,
        }
    }

    /// Wire the build collaborator invoked for `build_first` deploys.
    pub fn with_builder(mut self, builder: Box<dyn BuildRunner>) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Names of the registered strategies.
    pub fn strategies(&self) -> Vec<String> {
        self.deployers.keys().map(|s| s.to_string()).collect()
    }

    /// Pre-flight the backend for a configuration without deploying.
    pub fn validate(&self, config: &DeploymentConfig) -> Result<(), DeployError> {
        self.backend(config.strategy)?.validate(config)
    }

    /// Execute a deployment with the given configuration.
    pub fn deploy(&self, config: &DeploymentConfig) -> Result<DeploymentResult, DeployError> {
        let backend = self.backend(config.strategy)?;

        // Pre-deployment build, if requested.
        let build_executed = config.build_first;
        if config.build_first {
            info!("running pre-deployment build");

            let builder = self.builder.as_deref().ok_or_else(|| {
                DeployError::Config(
                    "build requested but no build runner is configured".to_string(),
                )
            })?;

            let outcome = builder.run();
            if !outcome.success {
                let mut result = DeploymentResult::for_strategy(config.strategy);
                result.build_executed = true;
                result.errors = outcome.errors;
                return Err(DeployError::failed(result, "pre-deployment build failed"));
            }

            info!("pre-deployment build completed successfully");
        }

        // Pre-deployment content validation.
        if !config.skip_content_check {
            info!("running pre-deployment validation");

            let options = default_validation_options();
            let validation = match validate_deployment(&config.source_dir, &options) {
                Ok(validation) => validation,
                Err(err) => {
                    let mut result = DeploymentResult::for_strategy(config.strategy);
                    result.build_executed = build_executed;
                    return Err(DeployError::failed(
                        result,
                        format!("pre-deployment validation failed: {err}"),
                    ));
                }
            };

            for issue in &validation.issues {
                debug!(
                    "{} [{}]: {} (in {})",
                    issue.kind,
                    issue.category,
                    issue.message,
                    issue.file.display()
                );
            }

            let errors = validation.count(IssueKind::Error);
            let warnings = validation.count(IssueKind::Warning);

            if errors > 0 {
                let mut result = DeploymentResult::for_strategy(config.strategy);
                result.build_executed = build_executed;
                result
                    .errors
                    .push(format!("validation found {errors} errors, deployment aborted"));
                return Err(DeployError::failed(
                    result,
                    format!("validation failed with {errors} errors"),
                ));
            }

            if warnings > 0 {
                warn!("found {warnings} validation warnings (deployment will continue)");
            }

            debug!("validation completed: {} files validated", validation.file_count);
        }

        // Dispatch, then record whatever result was produced.
        match backend.deploy(config) {
            Ok(mut result) => {
                result.build_executed = build_executed;
                self.record(&result, config);
                Ok(result)
            }
            Err(DeployError::Failed {
                mut result,
                message,
            }) => {
                result.build_executed = build_executed;
                self.record(&result, config);
                Err(DeployError::Failed { result, message })
            }
            Err(other) => Err(other),
        }
    }

    fn backend(&self, strategy: Strategy) -> Result<&dyn Deployer, DeployError> {
        self.deployers
            .get(&strategy)
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                DeployError::Config(format!("unsupported deployment strategy: {strategy}"))
            })
    }

    /// History recording is best-effort: failures are logged but never
    /// override the deployment's own outcome.
    fn record(&self, result: &DeploymentResult, config: &DeploymentConfig) {
        match HistoryStore::open(&self.ctx) {
            Ok(mut history) => {
                if let Err(err) = history.add_record(result, config) {
                    warn!("failed to record deployment history: {err:#}");
                }
            }
            Err(err) => warn!("failed to initialize deployment history: {err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildOutcome;
    use tempfile::TempDir;

    struct FixedBuild {
        success: bool,
    }

    impl BuildRunner for FixedBuild {
        fn run(&self) -> BuildOutcome {
            BuildOutcome {
                success: self.success,
                messages: vec![],
                errors: if self.success {
                    vec![]
                } else {
                    vec!["tailwind exited with status 1".to_string()]
                },
            }
        }
    }

    fn site_with_required_files(tmp: &TempDir) -> std::path::PathBuf {
        let site = tmp.path().join("site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(site.join("index.html"), "<html></html>").unwrap();
        std::fs::write(site.join("style.css"), "body{}").unwrap();
        site
    }

    // Netlify with probes skipped needs no external binary or network,
    // so these tests run anywhere.
    fn netlify_dry_run(tmp: &TempDir) -> DeploymentConfig {
        DeploymentConfig {
            strategy: Strategy::Netlify,
            dry_run: true,
            skip_validation: true,
            api_key: "token".into(),
            site_id: "site-123".into(),
            source_dir: tmp.path().join("site"),
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_strategy_is_immediate_error() {
        let tmp = TempDir::new().unwrap();
        let manager = Manager {
            ctx: ProjectContext::at(tmp.path()),
            deployers: BTreeMap::new(),
            builder: None,
        };

        let config = DeploymentConfig::default();
        let err = manager.deploy(&config).unwrap_err();
        assert!(err.to_string().contains("unsupported deployment strategy"));
        assert!(!tmp.path().join(".garp").exists());
    }

    #[test]
    fn test_dry_run_deploys_and_records_history() {
        let tmp = TempDir::new().unwrap();
        site_with_required_files(&tmp);

        let ctx = ProjectContext::at(tmp.path());
        let manager = Manager::new(ctx.clone());

        let result = manager.deploy(&netlify_dry_run(&tmp)).unwrap();
        assert!(result.success);
        assert!(!result.build_executed);
        assert!(result.messages[0].contains("site-123"));

        let history = HistoryStore::open(&ctx).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history.latest_successful().is_ok());
    }

    #[test]
    fn test_content_errors_abort_before_backend() {
        let tmp = TempDir::new().unwrap();
        let site = tmp.path().join("site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(site.join("index.html"), "<html></html>").unwrap();
        // style.css missing -> one error-typed issue

        let ctx = ProjectContext::at(tmp.path());
        let manager = Manager::new(ctx.clone());

        let err = manager.deploy(&netlify_dry_run(&tmp)).unwrap_err();
        let result = err.result().unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("validation found 1 errors"));

        // Aborted before dispatch: nothing recorded.
        let history = HistoryStore::open(&ctx).unwrap();
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_skip_content_check_bypasses_validation() {
        let tmp = TempDir::new().unwrap();
        let site = tmp.path().join("site");
        std::fs::create_dir_all(&site).unwrap();

        let manager = Manager::new(ProjectContext::at(tmp.path()));
        let mut config = netlify_dry_run(&tmp);
        config.skip_content_check = true;

        let result = manager.deploy(&config).unwrap();
        assert!(result.success);
    }

    #[test]
    fn test_build_failure_short_circuits() {
        let tmp = TempDir::new().unwrap();
        site_with_required_files(&tmp);

        let ctx = ProjectContext::at(tmp.path());
        let manager =
            Manager::new(ctx.clone()).with_builder(Box::new(FixedBuild { success: false }));

        let mut config = netlify_dry_run(&tmp);
        config.build_first = true;

        let err = manager.deploy(&config).unwrap_err();
        let result = err.result().unwrap();
        assert!(result.build_executed);
        assert!(result.errors.iter().any(|e| e.contains("tailwind")));

        let history = HistoryStore::open(&ctx).unwrap();
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_successful_build_is_tagged_on_result() {
        let tmp = TempDir::new().unwrap();
        site_with_required_files(&tmp);

        let manager = Manager::new(ProjectContext::at(tmp.path()))
            .with_builder(Box::new(FixedBuild { success: true }));

        let mut config = netlify_dry_run(&tmp);
        config.build_first = true;

        let result = manager.deploy(&config).unwrap();
        assert!(result.success);
        assert!(result.build_executed);
    }

    #[test]
    fn test_build_first_without_runner_is_config_error() {
        let tmp = TempDir::new().unwrap();
        site_with_required_files(&tmp);

        let manager = Manager::new(ProjectContext::at(tmp.path()));
        let mut config = netlify_dry_run(&tmp);
        config.build_first = true;

        let err = manager.deploy(&config).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }

    #[test]
    fn test_validate_is_backend_pass_through() {
        let tmp = TempDir::new().unwrap();
        let manager = Manager::new(ProjectContext::at(tmp.path()));

        // No source dir yet -> backend validation fails.
        let err = manager.validate(&netlify_dry_run(&tmp)).unwrap_err();
        assert!(err.to_string().contains("source directory"));
    }

    #[test]
    fn test_strategies_lists_all_backends() {
        let tmp = TempDir::new().unwrap();
        let manager = Manager::new(ProjectContext::at(tmp.path()));

        assert_eq!(
            manager.strategies(),
            vec!["git", "rsync", "netlify", "cloudflare"]
        );
    }
}
