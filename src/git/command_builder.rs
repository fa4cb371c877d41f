//! Type-safe Git command builder for consistent command execution
//!
//! Every git invocation goes through [`GitCommand`] so that timeouts, the
//! `-C` working directory, logging under the `git` target and the mapping of
//! failures onto [`StampError`] are the same everywhere.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::{GIT_CLONE_TIMEOUT, GIT_COMMAND_TIMEOUT};
use crate::core::StampError;
use crate::utils::platform::get_git_command;

/// Builder for a single git invocation.
///
/// # Examples
///
/// ```rust,no_run
/// use stamp_cli::git::command_builder::GitCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let status = GitCommand::new()
///     .args(["status", "--porcelain"])
///     .current_dir("/path/to/template")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct GitCommand {
    /// Command arguments to pass to Git (e.g., ["clone", "url", "path"])
    args: Vec<String>,

    /// Repository to run in, passed as `-C <dir>`
    current_dir: Option<PathBuf>,

    /// Environment variables to set for the Git process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for command completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Optional context string for log messages
    context: Option<String>,

    /// For clone commands, store the URL for better error messages
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            timeout_duration: Some(GIT_COMMAND_TIMEOUT),
            context: None,
            clone_url: None,
        }
    }
}

impl GitCommand {
    /// Creates a new Git command builder with the default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the command inside `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument to the Git command.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments to the Git command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context for logging (e.g., the template being copied)
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Execute the command and return the output
    ///
    /// # Errors
    ///
    /// - [`StampError::GitNotFound`] when git cannot be spawned
    /// - [`StampError::GitCloneFailed`] / [`StampError::GitCheckoutFailed`]
    ///   for failing clones and checkouts
    /// - [`StampError::GitCommandError`] for any other failure or a timeout
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let git_command = get_git_command();
        let mut cmd = Command::new(git_command);

        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        cmd.args(&full_args);

        let prefix = self.context.as_deref().map(|ctx| format!("({ctx}) ")).unwrap_or_default();
        tracing::debug!(
            target: "git",
            "{}Executing command: {} {}",
            prefix,
            git_command,
            full_args.join(" ")
        );

        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let operation = git_operation(&self.args).unwrap_or("unknown").to_string();

        let output_future = cmd.output();
        let spawned = match self.timeout_duration {
            Some(duration) => match timeout(duration, output_future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        target: "git",
                        "Command timed out after {} seconds: git {}",
                        duration.as_secs(),
                        full_args.join(" ")
                    );
                    return Err(StampError::GitCommandError {
                        operation,
                        stderr: format!(
                            "Git command timed out after {} seconds. This may indicate:\n\
                            - Network connectivity issues\n\
                            - Authentication prompts waiting for input\n\
                            Try running the command manually: git {}",
                            duration.as_secs(),
                            full_args.join(" ")
                        ),
                    }
                    .into());
                }
            },
            None => output_future.await,
        };

        let output = match spawned {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StampError::GitNotFound.into());
            }
            Err(e) => {
                return Err(e).context(format!("Failed to execute git {}", full_args.join(" ")));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "{}Command failed with exit code: {:?}",
                prefix,
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "git", "{}Error: {}", prefix, stderr.trim());
            }

            let reason = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            let error = match operation.as_str() {
                "clone" => StampError::GitCloneFailed {
                    url: self.clone_url.unwrap_or_else(|| "unknown".to_string()),
                    reason,
                },
                "checkout" => StampError::GitCheckoutFailed {
                    reference: self
                        .args
                        .iter()
                        .skip(1)
                        .rfind(|arg| !arg.starts_with('-'))
                        .cloned()
                        .unwrap_or_default(),
                    reason,
                },
                _ => StampError::GitCommandError {
                    operation,
                    stderr: reason,
                },
            };
            return Err(error.into());
        }

        if !stdout.trim().is_empty() {
            tracing::trace!(target: "git", "{}{}", prefix, stdout.trim());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Execute the command and return only stdout as a trimmed string
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Execute the command and discard its output
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// The git subcommand in `args`, skipping `-c key=value` overrides.
fn git_operation(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-c" {
            iter.next();
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

/// Output from a Git command
#[derive(Debug)]
pub struct GitCommandOutput {
    /// Standard output from the Git command
    pub stdout: String,
    /// Standard error output from the Git command
    pub stderr: String,
}

// Convenience builders for common Git operations

impl GitCommand {
    /// Create a clone command with the clone timeout
    pub fn clone(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new()
            .args(["clone", "--quiet", url])
            .arg(target.as_ref().display().to_string())
            .with_timeout(Some(GIT_CLONE_TIMEOUT));
        cmd.clone_url = Some(super::strip_auth_from_url(url));
        cmd
    }

    /// Create a checkout command that discards local modifications
    pub fn checkout(ref_name: &str) -> Self {
        Self::new().args(["-c", "advice.detachedHead=false"]).args([
            "checkout",
            "--quiet",
            "--force",
            ref_name,
        ])
    }

    /// Create a tag list command
    pub fn list_tags() -> Self {
        Self::new().args(["tag", "-l"])
    }

    /// Create a command describing HEAD by its closest tag
    pub fn describe() -> Self {
        Self::new().args(["describe", "--tags", "--always"])
    }

    /// Create a porcelain status command
    pub fn status_porcelain() -> Self {
        Self::new().args(["status", "--porcelain", "--untracked-files=all"])
    }

    /// Create an add command
    pub fn add_all() -> Self {
        Self::new().args(["add", "--all"])
    }

    /// Create a commit command that ignores hooks and signing
    pub fn commit(message: &str) -> Self {
        Self::new().args(["-c", "commit.gpgsign=false"]).args([
            "commit",
            "--quiet",
            "--no-verify",
            "-m",
            message,
        ])
    }
}
