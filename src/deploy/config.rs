//! Deployment configuration and result types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deploy::error::DeployError;
use crate::util::context::DEFAULT_SITE_DIR;

/// Deployment transport selector.
///
/// The backend set is closed: every variant maps to exactly one
/// registered [`Deployer`](crate::deploy::Deployer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Git,
    Rsync,
    Netlify,
    Cloudflare,
}

impl Strategy {
    /// All selectable strategies, in registration order.
    pub fn all() -> [Strategy; 4] {
        [
            Strategy::Git,
            Strategy::Rsync,
            Strategy::Netlify,
            Strategy::Cloudflare,
        ]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Git => "git",
            Strategy::Rsync => "rsync",
            Strategy::Netlify => "netlify",
            Strategy::Cloudflare => "cloudflare",
        };
        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git" => Ok(Strategy::Git),
            "rsync" => Ok(Strategy::Rsync),
            "netlify" => Ok(Strategy::Netlify),
            "cloudflare" => Ok(Strategy::Cloudflare),
            other => Err(DeployError::Config(format!(
                "unknown deployment strategy: {other}"
            ))),
        }
    }
}

/// Configuration for a single deployment invocation.
///
/// Built once from caller input and never mutated by the core.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    pub strategy: Strategy,

    /// Environment label recorded in history (e.g. "production").
    pub target: String,

    /// Report the intended action without transferring anything.
    pub dry_run: bool,

    pub verbose: bool,

    /// Run the build collaborator before deploying.
    pub build_first: bool,

    /// Skip backend reachability probes (SSH / API test calls).
    pub skip_validation: bool,

    /// Skip pre-deployment content validation.
    pub skip_content_check: bool,

    /// Built site directory all backends deploy from.
    pub source_dir: PathBuf,

    // Git
    pub git_remote: String,
    pub git_branch: Option<String>,

    // Rsync
    pub rsync_host: String,
    pub rsync_user: Option<String>,
    pub rsync_path: String,
    pub rsync_excludes: Vec<String>,

    // Hosted platforms (Netlify / Cloudflare Pages)
    pub api_key: String,
    pub project_id: String,
    pub site_id: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        DeploymentConfig {
            strategy: Strategy::Git,
            target: String::new(),
            dry_run: false,
            verbose: false,
            build_first: false,
            skip_validation: false,
            skip_content_check: false,
            source_dir: PathBuf::from(DEFAULT_SITE_DIR),
            git_remote: "origin".to_string(),
            git_branch: None,
            rsync_host: String::new(),
            rsync_user: None,
            rsync_path: String::new(),
            rsync_excludes: Vec::new(),
            api_key: String::new(),
            project_id: String::new(),
            site_id: String::new(),
        }
    }
}

impl DeploymentConfig {
    /// The git remote, falling back to `origin` when unset.
    pub fn git_remote_or_default(&self) -> &str {
        if self.git_remote.is_empty() {
            "origin"
        } else {
            &self.git_remote
        }
    }

    /// The rsync destination, `user@host:path` or `host:path`.
    pub fn rsync_destination(&self) -> String {
        match self.rsync_user.as_deref() {
            Some(user) if !user.is_empty() => {
                format!("{}@{}:{}", user, self.rsync_host, self.rsync_path)
            }
            _ => format!("{}:{}", self.rsync_host, self.rsync_path),
        }
    }
}

/// Outcome of one `deploy` call. Never mutated after return.
#[derive(Debug, Clone, Default)]
pub struct DeploymentResult {
    pub success: bool,
    pub strategy: Option<Strategy>,
    pub duration: Duration,
    pub build_executed: bool,
    pub url: Option<String>,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
}

impl DeploymentResult {
    /// An empty (not yet successful) result for the given strategy.
    pub fn for_strategy(strategy: Strategy) -> Self {
        DeploymentResult {
            strategy: Some(strategy),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse_round_trip() {
        for strategy in Strategy::all() {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_strategy_parse_rejects_unknown() {
        let err = "sftp".parse::<Strategy>().unwrap_err();
        assert!(err.to_string().contains("sftp"));
    }

    #[test]
    fn test_strategy_serde_uses_lowercase() {
        let json = serde_json::to_string(&Strategy::Cloudflare).unwrap();
        assert_eq!(json, "\"cloudflare\"");
        assert_eq!(
            serde_json::from_str::<Strategy>("\"rsync\"").unwrap(),
            Strategy::Rsync
        );
    }

    #[test]
    fn test_rsync_destination_with_and_without_user() {
        let mut config = DeploymentConfig {
            rsync_host: "example.com".into(),
            rsync_path: "/var/www".into(),
            ..Default::default()
        };
        assert_eq!(config.rsync_destination(), "example.com:/var/www");

        config.rsync_user = Some("deploy".into());
        assert_eq!(config.rsync_destination(), "deploy@example.com:/var/www");
    }

    #[test]
    fn test_git_remote_default() {
        let mut config = DeploymentConfig::default();
        assert_eq!(config.git_remote_or_default(), "origin");

        config.git_remote = "prod".into();
        assert_eq!(config.git_remote_or_default(), "prod");
    }
}
