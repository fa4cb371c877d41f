//! Global constants used throughout the stamp codebase.
//!
//! File names, default patterns and subprocess timeouts live here so the
//! generator, the CLI and the tests agree on them.

use std::time::Duration;

/// Schema file names looked up at the template root, in order of preference.
pub const SCHEMA_FILE_NAMES: &[&str] = &["stamp.yml", "stamp.yaml"];

/// Default location of the answers artifact inside the destination.
pub const DEFAULT_ANSWERS_FILE: &str = ".template-answers.yaml";

/// First line written to every answers artifact.
pub const ANSWERS_FILE_HEADER: &str =
    "# Changes here will be overwritten by stamp; do not edit manually";

/// Exclude patterns applied when the schema does not declare `_exclude`.
pub const DEFAULT_EXCLUDES: &[&str] =
    &["stamp.yml", "stamp.yaml", "~*", "*.py[co]", "__pycache__", ".DS_Store", ".svn"];

/// Paths that are never copied, whatever `_exclude` says.
pub const ALWAYS_EXCLUDED: &[&str] = &[".git"];

/// Name of the context object exposing render metadata to templates.
pub const CONTEXT_META_KEY: &str = "_stamp";

/// Environment variable set for every post-render task.
pub const TASK_STAGE_ENV: &str = "STAMP_STAGE";

/// Timeout for Git clone operations (120 seconds).
///
/// Clone operations may take longer than other commands, especially
/// for large template repositories.
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for every other Git command (5 minutes).
pub const GIT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for a single post-render task (10 minutes).
pub const TASK_TIMEOUT: Duration = Duration::from_secs(600);

/// Author identity used when snapshotting uncommitted template changes.
pub const SNAPSHOT_AUTHOR_NAME: &str = "stamp";

/// Author email used when snapshotting uncommitted template changes.
pub const SNAPSHOT_AUTHOR_EMAIL: &str = "stamp@localhost";
