//! Platform-specific helpers.

use std::path::PathBuf;

use anyhow::Result;

/// Whether this build targets Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Home directory of the current user.
///
/// # Errors
///
/// Fails when the platform does not report one (no `HOME` / `USERPROFILE`).
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Git executable name for the current platform.
///
/// The binary must be on `PATH`; a missing binary surfaces as
/// [`StampError::GitNotFound`](crate::core::StampError::GitNotFound) when a
/// command is spawned.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Shell and flag used to run a task command line.
#[must_use]
pub const fn get_shell_command() -> (&'static str, &'static str) {
    if is_windows() {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Expand `~` and environment variables in a user-supplied path.
///
/// # Errors
///
/// Fails when a referenced environment variable is not set or the home
/// directory is unknown.
///
/// # Examples
///
/// ```rust,no_run
/// use stamp_cli::utils::platform::resolve_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let templates = resolve_path("~/templates/python")?;
/// assert!(templates.is_absolute());
/// # Ok(())
/// # }
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full_with_context(
        path,
        || dirs::home_dir().map(|home| home.to_string_lossy().into_owned()),
        |var| std::env::var(var).map(Some),
    )
    .map_err(|e| anyhow::anyhow!("Failed to expand path '{path}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
