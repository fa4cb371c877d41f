//! Git operations wrapper for stamp
//!
//! Templates may live in git repositories. stamp drives the system `git`
//! binary (like Cargo's `git-fetch-with-cli`) so that SSH agents,
//! credential helpers and user configuration work unchanged. Every call is
//! async on Tokio and bounded by a timeout; see
//! [`command_builder::GitCommand`].
//!
//! [`GitRepo`] exposes the handful of operations copying needs: clone,
//! checkout, tag listing, `describe`, dirty detection and the snapshot
//! commit used to render uncommitted template changes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use stamp_cli::git::GitRepo;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let repo = GitRepo::clone("https://github.com/example/template.git", "/tmp/template").await?;
//! repo.checkout("v1.2.0").await?;
//! println!("rendering {}", repo.describe().await?);
//! # Ok(())
//! # }
//! ```

pub mod command_builder;


use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::constants::{SNAPSHOT_AUTHOR_EMAIL, SNAPSHOT_AUTHOR_NAME};
use command_builder::GitCommand;

/// Handle on a local git working tree.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Wrap an existing working tree; nothing is checked.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Clone `url` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::GitCloneFailed`] when git rejects the clone.
    ///
    /// [`StampError::GitCloneFailed`]: crate::core::StampError::GitCloneFailed
    pub async fn clone(url: &str, target: impl AsRef<Path>) -> Result<Self> {
        let target_path = target.as_ref();
        let display_url = strip_auth_from_url(url);
        GitCommand::clone(url, target_path)
            .with_context(display_url.as_str())
            .execute_success()
            .await?;
        tracing::debug!(target: "git", "Cloned {} into {}", display_url, target_path.display());
        Ok(Self::new(target_path))
    }

    /// Check out `ref_name` (branch, tag, commit or `HEAD`), discarding local changes.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::GitCheckoutFailed`] for unknown references.
    ///
    /// [`StampError::GitCheckoutFailed`]: crate::core::StampError::GitCheckoutFailed
    pub async fn checkout(&self, ref_name: &str) -> Result<()> {
        GitCommand::checkout(ref_name).current_dir(&self.path).execute_success().await
    }

    /// All tags, in git's ordering.
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        let stdout = GitCommand::list_tags()
            .current_dir(&self.path)
            .execute_stdout()
            .await
            .with_context(|| format!("Failed to list git tags in {}", self.path.display()))?;

        Ok(stdout.lines().filter(|line| !line.is_empty()).map(str::to_string).collect())
    }

    /// `git describe --tags --always` for `HEAD`, e.g. `v1.2.0-3-gabc1234`.
    pub async fn describe(&self) -> Result<String> {
        GitCommand::describe().current_dir(&self.path).execute_stdout().await
    }

    /// Whether the working tree has uncommitted or untracked changes.
    pub async fn is_dirty(&self) -> Result<bool> {
        let status =
            GitCommand::status_porcelain().current_dir(&self.path).execute_stdout().await?;
        Ok(!status.is_empty())
    }

    /// Commit every change in the working tree under the stamp identity.
    ///
    /// Author and committer are passed through the environment so the
    /// user's git configuration is neither needed nor modified.
    pub async fn commit_all(&self, message: &str) -> Result<()> {
        GitCommand::add_all().current_dir(&self.path).execute_success().await?;
        GitCommand::commit(message)
            .current_dir(&self.path)
            .env("GIT_AUTHOR_NAME", SNAPSHOT_AUTHOR_NAME)
            .env("GIT_AUTHOR_EMAIL", SNAPSHOT_AUTHOR_EMAIL)
            .env("GIT_COMMITTER_NAME", SNAPSHOT_AUTHOR_NAME)
            .env("GIT_COMMITTER_EMAIL", SNAPSHOT_AUTHOR_EMAIL)
            .execute_success()
            .await
    }

    /// Whether the path holds a git working tree (`.git` directory or file).
    pub fn is_git_repo(&self) -> bool {
        is_git_repo(&self.path)
    }

    /// Path of the working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether `path` is the root of a git working tree.
pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Strip credentials from an `http(s)` URL for display.
///
/// ```
/// use stamp_cli::git::strip_auth_from_url;
///
/// assert_eq!(
///     strip_auth_from_url("https://token@github.com/org/template.git"),
///     "https://github.com/org/template.git"
/// );
/// assert_eq!(strip_auth_from_url("git@github.com:org/t.git"), "git@github.com:org/t.git");
/// ```
pub fn strip_auth_from_url(url: &str) -> String {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = url.strip_prefix(scheme) {
            let host_end = rest.find('/').unwrap_or(rest.len());
            if let Some(at_pos) = rest[..host_end].rfind('@') {
                return format!("{scheme}{}", &rest[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}
