//! Deployment history ledger.
//!
//! An append-only, capped record of past deployments backed by a single
//! JSON document under `.garp/`. Records are immutable once appended;
//! the store only ever trims the oldest entries beyond the retention
//! cap.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deploy::config::{DeploymentConfig, DeploymentResult};
use crate::deploy::git;
use crate::util::context::ProjectContext;
use crate::util::fs::ensure_dir;

/// Maximum number of records kept on disk; the oldest are dropped first.
pub const RETENTION_LIMIT: usize = 50;

/// One past deployment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub strategy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    pub success: bool,
    pub duration_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub build_executed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// The deployment history for one project.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    project_root: PathBuf,
    records: Vec<DeploymentRecord>,
}

impl HistoryStore {
    /// Open (or lazily create) the history for a project.
    pub fn open(ctx: &ProjectContext) -> Result<Self> {
        ensure_dir(&ctx.garp_dir())?;

        let path = ctx.history_path();
        let records = if path.exists() {
            let contents = crate::util::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse deployment history: {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(HistoryStore {
            path,
            project_root: ctx.root().to_path_buf(),
            records,
        })
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record for a finished deployment and persist.
    ///
    /// The in-memory list is only updated after the document has been
    /// written; a failed save leaves both memory and disk exactly as
    /// they were, so there is never more than one visible version.
    pub fn add_record(
        &mut self,
        result: &DeploymentResult,
        config: &DeploymentConfig,
    ) -> Result<String> {
        let record = DeploymentRecord {
            id: generate_deployment_id(),
            timestamp: Utc::now(),
            strategy: result
                .strategy
                .unwrap_or(config.strategy)
                .to_string(),
            target: config.target.clone(),
            success: result.success,
            duration_secs: result.duration.as_secs(),
            url: result.url.clone(),
            git_branch: git::current_branch(&self.project_root),
            git_commit: git::current_commit(&self.project_root),
            build_executed: result.build_executed,
            messages: result.messages.clone(),
            errors: result.errors.clone(),
        };
        let id = record.id.clone();

        let mut next = self.records.clone();
        next.push(record);
        if next.len() > RETENTION_LIMIT {
            let excess = next.len() - RETENTION_LIMIT;
            next.drain(..excess);
        }

        self.save(&next)?;
        self.records = next;
        Ok(id)
    }

    /// The most recent successful deployment.
    pub fn latest_successful(&self) -> Result<&DeploymentRecord> {
        match self
            .sorted_newest_first()
            .into_iter()
            .find(|r| r.success)
        {
            Some(record) => Ok(record),
            None => bail!("no successful deployments found"),
        }
    }

    /// Up to `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<DeploymentRecord> {
        self.sorted_newest_first()
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Find a record by its exact ID.
    pub fn by_id(&self, id: &str) -> Result<&DeploymentRecord> {
        match self.records.iter().find(|r| r.id == id) {
            Some(record) => Ok(record),
            None => bail!("deployment with ID {id} not found"),
        }
    }

    fn sorted_newest_first(&self) -> Vec<&DeploymentRecord> {
        let mut sorted: Vec<&DeploymentRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }

    fn save(&self, records: &[DeploymentRecord]) -> Result<()> {
        let contents = serde_json::to_string_pretty(records)
            .context("failed to serialize deployment history")?;
        crate::util::fs::write_atomic(&self.path, &contents)
    }
}

fn generate_deployment_id() -> String {
    format!("deploy-{}", Uuid::new_v4().simple())
}
