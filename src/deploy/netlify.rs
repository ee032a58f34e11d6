//! Netlify deployment backend.
//!
//! Packages the built site into a zip archive and uploads it to the
//! Netlify deploys API as a single multipart request.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::deploy::config::{DeploymentConfig, DeploymentResult, Strategy};
use crate::deploy::error::DeployError;
use crate::deploy::{http_client, Deployer, PROBE_TIMEOUT};

const API_BASE: &str = "https://api.netlify.com/api/v1";

/// Netlify-based deployment.
#[derive(Debug, Default)]
pub struct NetlifyDeployer;

impl NetlifyDeployer {
    pub fn new() -> Self {
        NetlifyDeployer
    }

    fn test_api_connection(&self, api_key: &str, site_id: &str) -> Result<(), DeployError> {
        let url = format!("{API_BASE}/sites/{site_id}");

        let response = http_client()?
            .get(&url)
            .bearer_auth(api_key)
            .timeout(PROBE_TIMEOUT)
            .send()
            .map_err(|e| DeployError::External(format!("Netlify API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(DeployError::External(format!(
                "Netlify API returned status {status}: {body}"
            )));
        }

        Ok(())
    }

    fn upload(&self, config: &DeploymentConfig, archive: &Path) -> Result<String> {
        let mut bytes = Vec::new();
        std::fs::File::open(archive)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .with_context(|| format!("failed to read archive: {}", archive.display()))?;

        let form = Form::new().part(
            "file",
            Part::bytes(bytes)
                .file_name("deploy.zip")
                .mime_str("application/zip")
                .context("failed to build multipart body")?,
        );

        let url = format!("{API_BASE}/sites/{}/deploys", config.site_id);
        debug!("uploading archive to {url}");

        let response = http_client()?
            .post(&url)
            .bearer_auth(&config.api_key)
            .multipart(form)
            .send()
            .context("Netlify upload request failed")?;

        let status = response.status();
        let body = response.text().context("failed to read Netlify response")?;

        if status.as_u16() != 200 && status.as_u16() != 201 {
            anyhow::bail!("deployment failed with status {status}: {body}");
        }

        let parsed: serde_json::Value =
            serde_json::from_str(&body).context("failed to parse Netlify response")?;

        let deploy_url = parsed
            .get("deploy_ssl_url")
            .and_then(|u| u.as_str())
            .or_else(|| parsed.get("url").and_then(|u| u.as_str()))
            .unwrap_or_default()
            .to_string();

        Ok(deploy_url)
    }
}

impl Deployer for NetlifyDeployer {
    fn name(&self) -> &'static str {
        "Netlify"
    }

    fn validate(&self, config: &DeploymentConfig) -> Result<(), DeployError> {
        if config.api_key.is_empty() {
            return Err(DeployError::Config(
                "Netlify API key is required (use --api-key)".to_string(),
            ));
        }

        if config.site_id.is_empty() {
            return Err(DeployError::Config(
                "Netlify site ID is required (use --site-id)".to_string(),
            ));
        }

        if !config.source_dir.is_dir() {
            return Err(DeployError::Filesystem {
                path: config.source_dir.clone(),
                message: "source directory does not exist - run the build first".to_string(),
            });
        }

        if !config.skip_validation {
            self.test_api_connection(&config.api_key, &config.site_id)?;
        }

        Ok(())
    }

    fn deploy(&self, config: &DeploymentConfig) -> Result<DeploymentResult, DeployError> {
        let mut result = DeploymentResult::for_strategy(Strategy::Netlify);
        let start = Instant::now();

        info!("starting Netlify deployment to site {}", config.site_id);

        if let Err(err) = self.validate(config) {
            result.duration = start.elapsed();
            return Err(DeployError::failed(result, err.to_string()));
        }

        if config.dry_run {
            result
                .messages
                .push(format!("Would deploy to Netlify site {}", config.site_id));
            result.success = true;
            result.duration = start.elapsed();
            return Ok(result);
        }

        debug!("creating deployment archive");

        // NamedTempFile removes the archive on drop, success or failure.
        let archive = match create_deployment_archive(&config.source_dir) {
            Ok(archive) => archive,
            Err(err) => {
                result.duration = start.elapsed();
                return Err(DeployError::failed(
                    result,
                    format!("failed to create deployment archive: {err:#}"),
                ));
            }
        };

        let deploy_url = match self.upload(config, archive.path()) {
            Ok(url) => url,
            Err(err) => {
                result.duration = start.elapsed();
                return Err(DeployError::failed(
                    result,
                    format!("Netlify upload failed: {err:#}"),
                ));
            }
        };

        result
            .messages
            .push("Successfully deployed to Netlify".to_string());
        if !deploy_url.is_empty() {
            result.url = Some(deploy_url);
        }
        result.success = true;
        result.duration = start.elapsed();

        info!("Netlify deployment completed in {:?}", result.duration);
        Ok(result)
    }
}

/// Zip every regular file under `source_dir`, preserving relative paths.
/// Directory entries are skipped; the archive lives in a temp file.
fn create_deployment_archive(source_dir: &Path) -> Result<NamedTempFile> {
    let tmp = tempfile::Builder::new()
        .prefix("garp-netlify-")
        .suffix(".zip")
        .tempfile()
        .context("failed to create temporary archive")?;

    let file = tmp.reopen().context("failed to reopen temporary archive")?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir) {
        let entry = entry.context("failed to walk source directory")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(source_dir)
            .context("failed to relativize path")?;

        zip.start_file(rel_path.to_string_lossy().into_owned(), options)
            .with_context(|| format!("failed to add {} to archive", rel_path.display()))?;

        let mut f = std::fs::File::open(entry.path())
            .with_context(|| format!("failed to open {}", entry.path().display()))?;
        std::io::copy(&mut f, &mut zip)
            .with_context(|| format!("failed to write {} to archive", rel_path.display()))?;
    }

    zip.finish().context("failed to finalize archive")?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_requires_credentials() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("site")).unwrap();

        let mut config = DeploymentConfig {
            strategy: Strategy::Netlify,
            source_dir: tmp.path().join("site"),
            ..Default::default()
        };

        let err = NetlifyDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("API key"));

        config.api_key = "token".into();
        let err = NetlifyDeployer::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("site ID"));
    }

    #[test]
    fn test_dry_run_makes_no_network_calls() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("site")).unwrap();

        let config = DeploymentConfig {
            strategy: Strategy::Netlify,
            source_dir: tmp.path().join("site"),
            api_key: "token".into(),
            site_id: "site-123".into(),
            dry_run: true,
            skip_validation: true,
            ..Default::default()
        };

        let result = NetlifyDeployer::new().deploy(&config).unwrap();
        assert!(result.success);
        assert!(result.messages[0].contains("site-123"));
    }

    #[test]
    fn test_archive_preserves_relative_paths() {
        let tmp = TempDir::new().unwrap();
        let site = tmp.path().join("site");
        std::fs::create_dir_all(site.join("assets")).unwrap();
        std::fs::write(site.join("index.html"), "<html></html>").unwrap();
        std::fs::write(site.join("assets/app.css"), "body{}").unwrap();

        let archive = create_deployment_archive(&site).unwrap();
        let file = std::fs::File::open(archive.path()).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();

        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec!["assets/app.css", "index.html"]);
    }
}
