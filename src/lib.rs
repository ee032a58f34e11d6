//! Garp - deployment tooling for static sites.
//!
//! This crate provides the deployment core of the garp CLI: a
//! strategy-polymorphic publisher (git, rsync, Netlify, Cloudflare
//! Pages) with pre-deploy content validation, a durable deployment
//! history, and named environment profiles.

pub mod build;
pub mod deploy;
pub mod util;

pub use deploy::{
    DeployError, DeploymentConfig, DeploymentRecord, DeploymentResult, Deployer, EnvironmentConfig,
    EnvironmentStore, HistoryStore, Manager, Strategy,
};
pub use util::ProjectContext;
