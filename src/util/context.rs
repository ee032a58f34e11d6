//! Project context for garp operations.
//!
//! Provides centralized access to the project-relative paths the
//! deployment subsystem reads and writes:
//! - `.garp/deployment-history.json` - the deployment ledger
//! - `.garp/deploy-config.json` - named environment profiles
//! - `site/` - the default build output directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Name of the per-project state directory.
pub const PROJECT_DIR: &str = ".garp";

/// Default build output directory deployed by all backends.
pub const DEFAULT_SITE_DIR: &str = "site";

/// Resolved project paths.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    root: PathBuf,
}

impl ProjectContext {
    /// Create a context rooted at the current working directory.
    pub fn new() -> Result<Self> {
        let root = std::env::current_dir().context("failed to determine current directory")?;
        Ok(ProjectContext { root })
    }

    /// Create a context rooted at an explicit directory.
    pub fn at(root: impl AsRef<Path>) -> Self {
        ProjectContext {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.garp` state directory.
    pub fn garp_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Path of the deployment history document.
    pub fn history_path(&self) -> PathBuf {
        self.garp_dir().join("deployment-history.json")
    }

    /// Path of the environment configuration document.
    pub fn deploy_config_path(&self) -> PathBuf {
        self.garp_dir().join("deploy-config.json")
    }

    /// Default site output directory.
    pub fn site_dir(&self) -> PathBuf {
        self.root.join(DEFAULT_SITE_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_project_relative() {
        let ctx = ProjectContext::at("/tmp/project");

        assert_eq!(
            ctx.history_path(),
            PathBuf::from("/tmp/project/.garp/deployment-history.json")
        );
        assert_eq!(
            ctx.deploy_config_path(),
            PathBuf::from("/tmp/project/.garp/deploy-config.json")
        );
        assert_eq!(ctx.site_dir(), PathBuf::from("/tmp/project/site"));
    }
}
