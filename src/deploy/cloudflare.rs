//! Cloudflare Pages deployment backend.
//!
//! Uploads every file in the built site as an individual multipart form
//! field keyed by its relative path - the direct-upload shape of the
//! Pages deployments endpoint. No archive step.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::deploy::config::{DeploymentConfig, DeploymentResult, Strategy};
use crate::deploy::error::DeployError;
use crate::deploy::{http_client, Deployer, PROBE_TIMEOUT};

const API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Deserialize)]
struct DeployResponse {
    success: bool,
    #[serde(default)]
    result: Option<DeployResult>,
}

#[derive(Debug, Deserialize)]
struct DeployResult {
    #[serde(default)]
    url: Option<String>,
}

/// Cloudflare Pages deployment.
#[derive(Debug, Default)]
pub struct CloudflareDeployer;

impl CloudflareDeployer {
    pub fn new() -> Self {
        CloudflareDeployer
    }

    fn test_api_connection(&self, api_token: &str, account_id: &str) -> Result<(), DeployError> {
        let url = format!("{API_BASE}/accounts/{account_id}");

        let response = http_client()?
            .get(&url)
            .bearer_auth(api_token)
            .timeout(PROBE_TIMEOUT)
            .send()
            .map_err(|e| DeployError::External(format!("Cloudflare API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(DeployError::External(format!(
                "Cloudflare API returned status {status}: {body}"
            )));
        }

        Ok(())
    }

    fn upload(&self, config: &DeploymentConfig) -> Result<String> {
        let form = build_upload_form(&config.source_dir)?;

        let url = format!(
            "{API_BASE}/accounts/{}/pages/projects/{}/deployments",
            config.project_id, config.site_id
        );
        debug!("uploading site files to {url}");

        let response = http_client()?
            .post(&url)
            .bearer_auth(&config.api_key)
            .multipart(form)
            .send()
            .context("Cloudflare upload request failed")?;

        let status = response.status();
        let body = response
            .text()
            .context("failed to read Cloudflare response")?;

        if status.as_u16() != 200 && status.as_u16() != 201 {
            anyhow::bail!("deployment failed with status {status}: {body}");
        }

        let parsed: DeployResponse =
            serde_json::from_str(&body).context("failed to parse Cloudflare response")?;

        if !parsed.success {
            anyhow::bail!("deployment was not successful: {body}");
        }

        Ok(parsed
            .result
            .and_then(|r| r.url)
            .unwrap_or_default())
    }
}

impl Deployer for CloudflareDeployer {
    fn name(&self) -> &'static str {
        "Cloudflare Pages"
    }

    fn validate(&self, config: &DeploymentConfig) -> Result<(), DeployError> {
        if config.api_key.is_empty() {
            return Err(DeployError::Config(
                "Cloudflare API token is required (use --api-key)".to_string(),
            ));
        }

        if config.project_id.is_empty() {
            return Err(DeployError::Config(
                "Cloudflare account ID is required (use --project-id)".to_string(),
            ));
        }

        if config.site_id.is_empty() {
            return Err(DeployError::Config(
                "Cloudflare Pages project name is required (use --site-id)".to_string(),
            ));
        }

        if !config.source_dir.is_dir() {
            return Err(DeployError::Filesystem {
                path: config.source_dir.clone(),
                message: "source directory does not exist - run the build first".to_string(),
            });
        }

        if !config.skip_validation {
            self.test_api_connection(&config.api_key, &config.project_id)?;
        }

        Ok(())
    }

    fn deploy(&self, config: &DeploymentConfig) -> Result<DeploymentResult, DeployError> {
        let mut result = DeploymentResult::for_strategy(Strategy::Cloudflare);
        let start = Instant::now();

        info!(
            "starting Cloudflare Pages deployment to project {}",
            config.site_id
        );

        if let Err(err) = self.validate(config) {
            result.duration = start.elapsed();
            return Err(DeployError::failed(result, err.to_string()));
        }

        if config.dry_run {
            result.messages.push(format!(
                "Would deploy to Cloudflare Pages project {}",
                config.site_id
            ));
            result.success = true;
            result.duration = start.elapsed();
            return Ok(result);
        }

        let deploy_url = match self.upload(config) {
            Ok(url) => url,
            Err(err) => {
                result.duration = start.elapsed();
                return Err(DeployError::failed(
                    result,
                    format!("Cloudflare Pages deployment failed: {err:#}"),
                ));
            }
        };

        result
            .messages
            .push("Successfully deployed to Cloudflare Pages".to_string());
        if !deploy_url.is_empty() {
            result.url = Some(deploy_url);
        }
        result.success = true;
        result.duration = start.elapsed();

        info!(
            "Cloudflare Pages deployment completed in {:?}",
            result.duration
        );
        Ok(result)
    }
}

/// One multipart part per file, keyed by relative path.
fn build_upload_form(source_dir: &Path) -> Result<Form> {
    let mut form = Form::new();

    for entry in WalkDir::new(source_dir) {
        let entry = entry.context("failed to walk source directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(source_dir)
            .context("failed to relativize path")?
            .to_string_lossy()
            .into_owned();

        let bytes = std::fs::read(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;

        form = form.part(rel_path.clone(), Part::bytes(bytes).file_name(rel_path));
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_requires_all_credentials() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("site")).unwrap();

        let mut config = DeploymentConfig {
            strategy: Strategy::Cloudflare,
            source_dir: tmp.path().join("site"),
            ..Default::default()
        };

        let err = CloudflareDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("API token"));

        config.api_key = "token".into();
        let err = CloudflareDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("account ID"));

        config.project_id = "acct".into();
        let err = CloudflareDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("project name"));
    }

    #[test]
    fn test_dry_run_short_circuits() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("site")).unwrap();

        let config = DeploymentConfig {
            strategy: Strategy::Cloudflare,
            source_dir: tmp.path().join("site"),
            api_key: "token".into(),
            project_id: "acct".into(),
            site_id: "my-site".into(),
            dry_run: true,
            skip_validation: true,
            ..Default::default()
        };

        let result = CloudflareDeployer::new().deploy(&config).unwrap();
        assert!(result.success);
        assert!(result.messages[0].contains("my-site"));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"success":true,"result":{"url":"https://my-site.pages.dev"}}"#;
        let parsed: DeployResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        assert_eq!(
            parsed.result.unwrap().url.as_deref(),
            Some("https://my-site.pages.dev")
        );

        let body = r#"{"success":false,"errors":[{"code":8000000,"message":"bad token"}]}"#;
        let parsed: DeployResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
    }
}
