//! Shell-backed project builder and package describer.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sdkdiff_core::{Error as CoreError, PackageDescribing, ProjectBuilding, ProjectSource};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::BuildConfig;

const SCHEME_PLACEHOLDER: &str = "{scheme}";

/// Failure of an external command.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Run a command line through `sh -c` in `dir`, returning stdout.
pub fn run_shell(command: &str, dir: &Path) -> Result<String, ShellError> {
    debug!("$ {} (in {})", command, dir.display());
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .output()
        .map_err(|source| ShellError::Spawn {
            command: command.to_string(),
            source,
        })?;
    check_output(command, output)
}

fn check_output(command: &str, output: Output) -> Result<String, ShellError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(ShellError::Failed {
            command: command.to_string(),
            status: output.status.to_string(),
            stderr: last_lines(&String::from_utf8_lossy(&output.stderr), 20),
        })
    }
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    lines[lines.len().saturating_sub(count)..].join("\n")
}

/// Stable checkout directory name for a remote source.
pub fn checkout_dir_name(branch: &str, repository: &str) -> String {
    let hash = blake3::hash(format!("{}~{}", branch, repository).as_bytes());
    hash.to_hex().as_str()[..16].to_string()
}

/// [`ProjectBuilding`] that clones remote sources and runs configured
/// build commands.
#[derive(Debug, Clone)]
pub struct ShellProjectBuilder {
    config: BuildConfig,
}

impl ShellProjectBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Resolve a source into a directory on disk, cloning if needed.
    fn checkout(&self, source: &ProjectSource) -> Result<PathBuf, CoreError> {
        match source {
            ProjectSource::Local { path } => {
                if !path.is_dir() {
                    let message = format!("{} is not a directory", path.display());
                    return Err(build_error(source, message));
                }
                Ok(path.clone())
            }
            ProjectSource::Remote { branch, repository } => {
                let target = self
                    .config
                    .work_dir
                    .join(checkout_dir_name(branch, repository));
                if target.exists() {
                    std::fs::remove_dir_all(&target)?;
                }
                std::fs::create_dir_all(&self.config.work_dir)?;

                info!("🐱 Cloning {} @ {}", repository, branch);
                let output = Command::new("git")
                    .args(["clone", "--depth", "1", "--branch", branch.as_str(), repository.as_str()])
                    .arg(&target)
                    .output()
                    .map_err(|e| build_error(source, e.to_string()))?;
                check_output("git clone", output)
                    .map_err(|e| build_error(source, e.to_string()))?;
                Ok(target)
            }
        }
    }

    fn build_command(&self, scheme: Option<&str>) -> String {
        match scheme {
            Some(scheme) => self.config.project_command.replace(SCHEME_PLACEHOLDER, scheme),
            None => self.config.package_command.clone(),
        }
    }
}

impl ProjectBuilding for ShellProjectBuilder {
    fn build(&self, source: &ProjectSource, scheme: Option<&str>) -> Result<PathBuf, CoreError> {
        let project_dir = self.checkout(source)?;
        let command = self.build_command(scheme);

        info!("🛠️ Building {}", source);
        run_shell(&command, &project_dir).map_err(|e| build_error(source, e.to_string()))?;
        Ok(project_dir)
    }
}

fn build_error(source: &ProjectSource, message: String) -> CoreError {
    CoreError::Build {
        source_description: source.to_string(),
        message,
    }
}

/// [`PackageDescribing`] that runs the configured describe command.
#[derive(Debug, Clone)]
pub struct ShellPackageDescriber {
    command: String,
}

impl ShellPackageDescriber {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PackageDescribing for ShellPackageDescriber {
    fn describe(&self, project_dir: &Path) -> Result<String, CoreError> {
        run_shell(&self.command, project_dir).map_err(|e| CoreError::LibraryAnalysis {
            message: e.to_string(),
        })
    }
}
