//! Deployment orchestration.
//!
//! A strategy-polymorphic publisher: the [`Manager`] validates the built
//! site, dispatches to one of a closed set of transport backends (git
//! push, rsync, Netlify, Cloudflare Pages), and durably records the
//! outcome in the deployment history.

pub mod cloudflare;
pub mod config;
pub mod environment;
pub mod error;
pub mod git;
pub mod history;
pub mod manager;
pub mod netlify;
pub mod rsync;
pub mod validation;

use std::time::Duration;

pub use cloudflare::CloudflareDeployer;
pub use config::{DeploymentConfig, DeploymentResult, Strategy};
pub use environment::{EnvironmentConfig, EnvironmentStore};
pub use error::DeployError;
pub use git::GitDeployer;
pub use history::{DeploymentRecord, HistoryStore};
pub use manager::Manager;
pub use netlify::NetlifyDeployer;
pub use rsync::RsyncDeployer;

/// Upper bound for transfer requests. Uploads past this hang the CLI,
/// so the limit is a hard requirement rather than a tuning knob.
pub(crate) const TRANSFER_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Upper bound for reachability probes.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A deployment transport backend.
///
/// Implementations encapsulate one transport's auth, packaging and
/// transfer mechanics behind a uniform contract.
pub trait Deployer {
    /// Human label for this backend. No side effects.
    fn name(&self) -> &'static str;

    /// Check backend-specific prerequisites: required configuration
    /// present, external tool or network reachable, source directory
    /// exists. Repeatable and read-only apart from an optional network
    /// test call (skipped when `skip_validation` is set).
    fn validate(&self, config: &DeploymentConfig) -> Result<(), DeployError>;

    /// Perform the transfer. Honors `dry_run` by describing the
    /// would-be action without performing it. On failure the returned
    /// [`DeployError::Failed`] carries a result with `success == false`
    /// and a populated error list.
    fn deploy(&self, config: &DeploymentConfig) -> Result<DeploymentResult, DeployError>;
}

/// Blocking HTTP client bounded by the transfer timeout.
pub(crate) fn http_client() -> Result<reqwest::blocking::Client, DeployError> {
    reqwest::blocking::Client::builder()
        .timeout(TRANSFER_TIMEOUT)
        .build()
        .map_err(|e| DeployError::External(format!("failed to build HTTP client: {e}")))
}
