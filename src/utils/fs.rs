//! File system helpers used while writing a rendered project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Create `path` and its parents if missing.
///
/// # Errors
///
/// Fails when the directory cannot be created or `path` exists and is not
/// a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Write `content` to `path` through a temporary sibling and a rename.
///
/// The file either holds the new content or does not exist; parent
/// directories are created as needed. On Unix the file gets the mode a
/// plain `File::create` would (`0o666` less the umask).
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;
    temp.persist(path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Whether `path` is missing or an empty directory.
///
/// # Errors
///
/// Fails when `path` cannot be read.
pub fn dir_is_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;
    Ok(entries.next().is_none())
}

/// Recursively copy `src` into `dst`, including hidden entries.
///
/// Symlinks are recreated on Unix and skipped elsewhere.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;

    for entry in walkdir::WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk: {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            ensure_dir(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        } else if file_type.is_symlink() {
            #[cfg(unix)]
            {
                let link = fs::read_link(entry.path())?;
                std::os::unix::fs::symlink(&link, &target)
                    .with_context(|| format!("Failed to create symlink: {}", target.display()))?;
            }
        }
    }
    Ok(())
}

/// Give `target` the permission bits of `source`.
///
/// Only Unix mode bits are carried over; elsewhere this is a no-op.
#[cfg(unix)]
pub fn copy_permissions(source: &fs::Metadata, target: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = source.permissions().mode() & 0o7777;
    fs::set_permissions(target, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on: {}", target.display()))
}

#[cfg(not(unix))]
pub fn copy_permissions(_source: &fs::Metadata, _target: &Path) -> Result<()> {
    Ok(())
}
