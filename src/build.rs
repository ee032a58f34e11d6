//! Build collaborator seam.
//!
//! The deployment core does not run the site build pipeline itself; it
//! only consumes a completion signal from it. [`BuildRunner`] is that
//! seam, and [`ShellBuildRunner`] is the default implementation wired
//! by the CLI: it invokes the project's build script, serializing
//! concurrent invocations behind a process-wide lock.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use crate::util::process::{combined_output, ProcessBuilder};

/// Environment variable overriding the default build command.
pub const BUILD_COMMAND_ENV: &str = "GARP_BUILD_COMMAND";

/// Default build script invoked when no override is configured.
pub const DEFAULT_BUILD_COMMAND: &str = "bin/build";

static BUILD_LOCK: Mutex<()> = Mutex::new(());

/// Completion signal of one build invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub success: bool,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
}

/// A thing that can produce a site build on demand.
pub trait BuildRunner {
    fn run(&self) -> BuildOutcome;
}

/// Runs the project build script as a subprocess.
#[derive(Debug, Clone)]
pub struct ShellBuildRunner {
    program: PathBuf,
    args: Vec<String>,
}

impl ShellBuildRunner {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        ShellBuildRunner {
            program: program.into(),
            args,
        }
    }

    /// Build command from `GARP_BUILD_COMMAND`, falling back to the
    /// project's `bin/build` script.
    pub fn from_env() -> Self {
        let command =
            std::env::var(BUILD_COMMAND_ENV).unwrap_or_else(|_| DEFAULT_BUILD_COMMAND.to_string());

        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| DEFAULT_BUILD_COMMAND.to_string());
        ShellBuildRunner::new(program, parts.collect())
    }
}

impl BuildRunner for ShellBuildRunner {
    fn run(&self) -> BuildOutcome {
        // One build at a time per process.
        let _guard = BUILD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let build = ProcessBuilder::new(&self.program).args(&self.args);
        debug!("executing build: {}", build.display_command());

        match build.exec() {
            Ok(output) if output.status.success() => BuildOutcome {
                success: true,
                messages: vec![format!("Build completed: {}", build.display_command())],
                errors: Vec::new(),
            },
            Ok(output) => BuildOutcome {
                success: false,
                messages: Vec::new(),
                errors: vec![format!(
                    "build command failed with exit code {:?}:\n{}",
                    output.status.code(),
                    combined_output(&output)
                )],
            },
            Err(err) => BuildOutcome {
                success: false,
                messages: Vec::new(),
                errors: vec![format!("failed to run build command: {err:#}")],
            },
        }
    }
}
