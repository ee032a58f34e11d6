//! Deployment error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::deploy::config::DeploymentResult;

/// Error during deployment operations.
///
/// Variants follow the failure taxonomy of the deployment subsystem:
/// bad configuration, failed validation, filesystem problems, missing or
/// unreachable external dependencies, and transfer failures. A transfer
/// failure carries the structured [`DeploymentResult`] so callers get
/// both the ordered error list and a conventional error value.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{message}: {path}")]
    Filesystem { path: PathBuf, message: String },

    #[error("{0}")]
    External(String),

    #[error("{message}")]
    Failed {
        result: Box<DeploymentResult>,
        message: String,
    },
}

impl DeployError {
    /// Wrap a failed deployment result, recording the message in its
    /// error list if not already present.
    pub fn failed(mut result: DeploymentResult, message: impl Into<String>) -> Self {
        let message = message.into();
        if !result.errors.iter().any(|e| e == &message) {
            result.errors.push(message.clone());
        }
        result.success = false;
        DeployError::Failed {
            result: Box::new(result),
            message,
        }
    }

    /// The deployment result attached to a transfer failure, if any.
    pub fn result(&self) -> Option<&DeploymentResult> {
        match self {
            DeployError::Failed { result, .. } => Some(result),
            _ => None,
        }
    }
}
