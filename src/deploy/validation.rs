//! Pre-deployment content validation.
//!
//! Walks the built output tree once, checking required files, per-file
//! size limits, and internal link/image integrity in HTML files. Only
//! `error`-typed issues block a deployment; everything else is advisory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::deploy::error::DeployError;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href=["']([^"']+)["']"#).unwrap());
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).unwrap());

/// Issue severity. Only `Error` blocks deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Error,
    Warning,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueKind::Error => "error",
            IssueKind::Warning => "warning",
        })
    }
}

/// What a validation issue is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    Link,
    Image,
    File,
    Size,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueCategory::Link => "link",
            IssueCategory::Image => "image",
            IssueCategory::File => "file",
            IssueCategory::Size => "size",
        })
    }
}

/// A single validation problem.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub category: IssueCategory,
    pub message: String,
    pub file: PathBuf,
}

/// Which checks run, and their thresholds.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub check_links: bool,
    pub check_images: bool,
    pub check_file_size: bool,
    /// Per-file ceiling in bytes; 0 disables the size check.
    pub max_file_size: u64,
    /// Paths (relative to the source dir) that must exist.
    pub required_files: Vec<String>,
}

/// Recommended validation policy: link and image checks on, a 10 MiB
/// per-file ceiling, and the two files every built site must ship.
pub fn default_validation_options() -> ValidationOptions {
    ValidationOptions {
        check_links: true,
        check_images: true,
        check_file_size: true,
        max_file_size: 10 * 1024 * 1024,
        required_files: vec!["index.html".to_string(), "style.css".to_string()],
    }
}

/// Aggregated validation outcome.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub success: bool,
    pub issues: Vec<ValidationIssue>,
    pub file_count: usize,
    pub total_size: u64,
    pub largest_file: Option<PathBuf>,
    pub largest_size: u64,
}

impl ValidationResult {
    /// Count of issues with the given severity.
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Walk every regular file under `source_dir` once, collecting issues.
pub fn validate_deployment(
    source_dir: &Path,
    options: &ValidationOptions,
) -> Result<ValidationResult, DeployError> {
    if !source_dir.is_dir() {
        return Err(DeployError::Filesystem {
            path: source_dir.to_path_buf(),
            message: "source directory does not exist".to_string(),
        });
    }

    let mut result = ValidationResult {
        success: true,
        ..Default::default()
    };

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| DeployError::Filesystem {
            path: source_dir.to_path_buf(),
            message: format!("error walking directory: {e}"),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let size = entry
            .metadata()
            .map_err(|e| DeployError::Filesystem {
                path: path.to_path_buf(),
                message: format!("failed to stat file: {e}"),
            })?
            .len();

        result.file_count += 1;
        result.total_size += size;

        // Ties keep the first-seen file.
        if size > result.largest_size {
            result.largest_size = size;
            result.largest_file = Some(path.to_path_buf());
        }

        if options.check_file_size && options.max_file_size > 0 && size > options.max_file_size {
            result.issues.push(ValidationIssue {
                kind: IssueKind::Warning,
                category: IssueCategory::Size,
                message: format!(
                    "File size ({size} bytes) exceeds limit ({} bytes)",
                    options.max_file_size
                ),
                file: path.to_path_buf(),
            });
        }

        if is_html(path) {
            if let Err(e) = validate_html_file(path, options, &mut result) {
                debug!("could not validate {}: {e}", path.display());
            }
        }
    }

    for required in &options.required_files {
        let full_path = source_dir.join(required);
        if !full_path.exists() {
            result.issues.push(ValidationIssue {
                kind: IssueKind::Error,
                category: IssueCategory::File,
                message: format!("Required file missing: {required}"),
                file: full_path,
            });
        }
    }

    result.success = result.count(IssueKind::Error) == 0;
    Ok(result)
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
    )
}

fn validate_html_file(
    path: &Path,
    options: &ValidationOptions,
    result: &mut ValidationResult,
) -> std::io::Result<()> {
    let content = std::fs::read_to_string(path)?;

    if options.check_links {
        validate_links(path, &content, result);
    }

    if options.check_images {
        validate_images(path, &content, result);
    }

    Ok(())
}

/// The path component of an href/src, with query and fragment stripped.
fn path_component(href: &str) -> &str {
    let without_fragment = href.split('#').next().unwrap_or("");
    without_fragment.split('?').next().unwrap_or("")
}

/// Resolve a link target on disk. Absolute paths resolve against the
/// site root, taken to be two levels above the referencing file.
fn resolve_target(file: &Path, link_path: &str) -> PathBuf {
    if let Some(rooted) = link_path.strip_prefix('/') {
        let site_root = file
            .parent()
            .and_then(|d| d.parent())
            .unwrap_or_else(|| Path::new("."));
        site_root.join(rooted)
    } else {
        file.parent()
            .unwrap_or_else(|| Path::new("."))
            .join(link_path)
    }
}

fn validate_links(file: &Path, content: &str, result: &mut ValidationResult) {
    for capture in LINK_RE.captures_iter(content) {
        let href = &capture[1];

        if href.starts_with("http://")
            || href.starts_with("https://")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with('#')
        {
            continue;
        }

        let link_path = path_component(href);
        if link_path.is_empty() {
            continue;
        }

        let target = resolve_target(file, link_path);
        if target.exists() {
            continue;
        }

        // Pretty URLs: `/about` may exist on disk as `/about.html`.
        if !link_path.ends_with(".html") {
            let mut with_ext = target.clone().into_os_string();
            with_ext.push(".html");
            if Path::new(&with_ext).exists() {
                continue;
            }
        }

        result.issues.push(ValidationIssue {
            kind: IssueKind::Warning,
            category: IssueCategory::Link,
            message: format!("Broken internal link: {href} -> {}", target.display()),
            file: file.to_path_buf(),
        });
    }
}

fn validate_images(file: &Path, content: &str, result: &mut ValidationResult) {
    for capture in IMAGE_RE.captures_iter(content) {
        let src = &capture[1];

        if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("data:") {
            continue;
        }

        let src_path = path_component(src);
        if src_path.is_empty() {
            continue;
        }

        let target = resolve_target(file, src_path);
        if !target.exists() {
            result.issues.push(ValidationIssue {
                kind: IssueKind::Warning,
                category: IssueCategory::Image,
                message: format!("Missing image: {src} -> {}", target.display()),
                file: file.to_path_buf(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options() -> ValidationOptions {
        ValidationOptions {
            required_files: vec![],
            ..default_validation_options()
        }
    }

    #[test]
    fn test_missing_source_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = validate_deployment(&tmp.path().join("nope"), &options()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_missing_required_file_fails_validation() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("index.html"), "<html></html>").unwrap();

        let opts = ValidationOptions {
            required_files: vec!["index.html".into(), "style.css".into()],
            ..options()
        };

        let result = validate_deployment(tmp.path(), &opts).unwrap();
        assert!(!result.success);
        assert_eq!(result.count(IssueKind::Error), 1);

        let issue = &result.issues[0];
        assert_eq!(issue.category, IssueCategory::File);
        assert!(issue.message.contains("style.css"));
    }

    #[test]
    fn test_warnings_do_not_fail_validation() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("a.html"),
            r#"<a href="missing.html">broken</a>"#,
        )
        .unwrap();

        let result = validate_deployment(tmp.path(), &options()).unwrap();
        assert!(result.success);
        assert_eq!(result.count(IssueKind::Warning), 1);
    }

    #[test]
    fn test_broken_and_valid_links() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("real.html"), "<html></html>").unwrap();
        std::fs::write(
            tmp.path().join("a.html"),
            r#"<a href="real.html">ok</a><a href="missing.html">broken</a>"#,
        )
        .unwrap();

        let result = validate_deployment(tmp.path(), &options()).unwrap();

        let link_issues: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::Link)
            .collect();
        assert_eq!(link_issues.len(), 1);
        assert!(link_issues[0].message.contains("missing.html"));
    }

    #[test]
    fn test_external_and_anchor_links_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("a.html"),
            concat!(
                r#"<a href="https://example.com/page">x</a>"#,
                r#"<a href="mailto:hi@example.com">x</a>"#,
                r#"<a href="tel:+15551234">x</a>"#,
                r##"<a href="#section">x</a>"##,
            ),
        )
        .unwrap();

        let result = validate_deployment(tmp.path(), &options()).unwrap();
        assert_eq!(result.count(IssueKind::Warning), 0);
    }

    #[test]
    fn test_pretty_url_retries_html_extension() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("about.html"), "<html></html>").unwrap();
        std::fs::write(tmp.path().join("a.html"), r#"<a href="about">about</a>"#).unwrap();

        let result = validate_deployment(tmp.path(), &options()).unwrap();
        assert_eq!(result.count(IssueKind::Warning), 0);
    }

    #[test]
    fn test_query_and_fragment_stripped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("page.html"), "<html></html>").unwrap();
        std::fs::write(
            tmp.path().join("a.html"),
            r#"<a href="page.html?utm=1#top">x</a>"#,
        )
        .unwrap();

        let result = validate_deployment(tmp.path(), &options()).unwrap();
        assert_eq!(result.count(IssueKind::Warning), 0);
    }

    #[test]
    fn test_missing_image_warns_without_retry() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("a.html"),
            concat!(
                r#"<img alt="x" src="logo.png">"#,
                r#"<img src="data:image/png;base64,AAAA">"#,
                r#"<img src="https://cdn.example.com/x.png">"#,
            ),
        )
        .unwrap();

        let result = validate_deployment(tmp.path(), &options()).unwrap();

        let image_issues: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::Image)
            .collect();
        assert_eq!(image_issues.len(), 1);
        assert!(image_issues[0].message.contains("logo.png"));
    }

    #[test]
    fn test_oversized_file_is_warning_only() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("big.bin"), vec![0u8; 2048]).unwrap();

        let opts = ValidationOptions {
            max_file_size: 1024,
            ..options()
        };

        let result = validate_deployment(tmp.path(), &opts).unwrap();
        assert!(result.success);
        assert_eq!(result.count(IssueKind::Warning), 1);
        assert_eq!(result.issues[0].category, IssueCategory::Size);
    }

    #[test]
    fn test_counts_and_largest_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("small.txt"), "ab").unwrap();
        std::fs::write(tmp.path().join("large.txt"), "abcdefgh").unwrap();

        let result = validate_deployment(tmp.path(), &options()).unwrap();
        assert_eq!(result.file_count, 2);
        assert_eq!(result.total_size, 10);
        assert_eq!(result.largest_size, 8);
        assert!(result
            .largest_file
            .as_ref()
            .unwrap()
            .ends_with("large.txt"));
    }
}
