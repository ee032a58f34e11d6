//! Named deployment environment profiles.
//!
//! Persisted key/value configuration per deployment target (staging,
//! production, ...) backed by a JSON document under `.garp/`, with the
//! same whole-document read-modify-write model as the history store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::context::ProjectContext;
use crate::util::fs::ensure_dir;

/// Configuration profile for one named environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,
    pub strategy: String,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Store of environment profiles, keyed by name.
#[derive(Debug)]
pub struct EnvironmentStore {
    path: PathBuf,
    configs: BTreeMap<String, EnvironmentConfig>,
}

impl EnvironmentStore {
    /// Open (or lazily create) the environment store for a project.
    pub fn open(ctx: &ProjectContext) -> Result<Self> {
        ensure_dir(&ctx.garp_dir())?;

        let path = ctx.deploy_config_path();
        let configs = if path.exists() {
            let contents = crate::util::fs::read_to_string(&path)?;
            serde_json::from_str(&contents).with_context(|| {
                format!("failed to parse deployment config: {}", path.display())
            })?
        } else {
            BTreeMap::new()
        };

        Ok(EnvironmentStore { path, configs })
    }

    /// Upsert an environment profile. The name is stamped into the
    /// stored value so lookups and listings stay consistent.
    pub fn set_environment(&mut self, name: &str, mut config: EnvironmentConfig) -> Result<()> {
        config.name = name.to_string();

        let mut next = self.configs.clone();
        next.insert(name.to_string(), config);

        self.save(&next)?;
        self.configs = next;
        Ok(())
    }

    /// Look up an environment by name.
    pub fn get_environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        match self.configs.get(name) {
            Some(config) => Ok(config),
            None => bail!("environment '{name}' not found"),
        }
    }

    /// All configured environment names, sorted.
    pub fn list_environments(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    /// Delete an environment profile and persist.
    pub fn remove_environment(&mut self, name: &str) -> Result<()> {
        let mut next = self.configs.clone();
        next.remove(name);

        self.save(&next)?;
        self.configs = next;
        Ok(())
    }

    fn save(&self, configs: &BTreeMap<String, EnvironmentConfig>) -> Result<()> {
        let contents = serde_json::to_string_pretty(configs)
            .context("failed to serialize deployment config")?;
        crate::util::fs::write_atomic(&self.path, &contents)
    }
}
