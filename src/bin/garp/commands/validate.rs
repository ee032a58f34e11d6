//! `garp validate` command
//!
//! Runs pre-deployment content validation without deploying.

use anyhow::{bail, Result};

use crate::cli::ValidateArgs;
use garp::deploy::validation::{default_validation_options, validate_deployment, IssueKind};

pub fn execute(args: ValidateArgs) -> Result<()> {
    let options = default_validation_options();
    let result = validate_deployment(&args.source_dir, &options)?;

    println!(
        "Validated {} files ({} bytes total)",
        result.file_count, result.total_size
    );
    if let Some(largest) = &result.largest_file {
        println!(
            "Largest file: {} ({} bytes)",
            largest.display(),
            result.largest_size
        );
    }

    for issue in &result.issues {
        println!(
            "{} [{}]: {} (in {})",
            issue.kind,
            issue.category,
            issue.message,
            issue.file.display()
        );
    }

    let errors = result.count(IssueKind::Error);
    let warnings = result.count(IssueKind::Warning);

    if errors > 0 {
        bail!("validation failed with {errors} errors and {warnings} warnings");
    }

    if warnings > 0 {
        println!("Validation passed with {warnings} warnings");
    } else {
        println!("Validation passed");
    }

    Ok(())
}
