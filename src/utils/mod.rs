//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - File system operations with atomic writes and directory checks
//! - [`platform`] - Platform-specific helpers and path resolution

pub mod fs;
pub mod platform;

pub use fs::{atomic_write, copy_dir_all, copy_permissions, dir_is_empty, ensure_dir};
pub use platform::{get_git_command, get_home_dir, get_shell_command, is_windows, resolve_path};
