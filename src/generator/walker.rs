//! Template tree rendering.
//!
//! Entries are visited in file-name order so a render is reproducible.
//! Every path component goes through the template engine; a component that
//! renders empty drops the entry (and everything below it), which is how
//! templates express optional files:
//!
//! ```text
//! {% if use_docs %}docs{% endif %}/index.md
//! ```
//!
//! With an empty `_templates_suffix` every UTF-8 file is rendered and other
//! files are copied byte for byte. With a suffix such as `.jinja` only
//! suffixed files are rendered and lose the suffix; the rest are copied.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context as _, Result};
use glob::{MatchOptions, Pattern};
use tera::Context;
use walkdir::WalkDir;

use crate::core::StampError;
use crate::templating::{TemplateError, TemplateRenderer};
use crate::utils::{atomic_write, copy_permissions, ensure_dir};

/// How a file reached the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Rendered,
    Copied,
}

/// A file written to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Destination-relative path
    pub path: PathBuf,
    pub action: FileAction,
}

/// Compiled `_exclude` patterns.
///
/// A pattern without `/` matches an entry of that name at any depth; a
/// pattern with `/` matches the template-relative path.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    names: Vec<Pattern>,
    paths: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::SchemaError`] for an invalid glob.
    pub fn new(patterns: &[String], schema_file: &Path) -> Result<Self, StampError> {
        let mut names = Vec::new();
        let mut paths = Vec::new();
        for raw in patterns {
            let trimmed = raw.trim_start_matches('/').trim_end_matches('/');
            let pattern = Pattern::new(trimmed).map_err(|e| StampError::SchemaError {
                file: schema_file.display().to_string(),
                reason: format!("invalid _exclude pattern '{raw}': {e}"),
            })?;
            if trimmed.contains('/') {
                paths.push(pattern);
            } else {
                names.push(pattern);
            }
        }
        Ok(Self {
            names,
            paths,
        })
    }

    /// Whether the template-relative `path` is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::default()
        };
        let path_text = path.to_string_lossy().replace('\\', "/");
        if self.paths.iter().any(|p| p.matches_with(&path_text, options)) {
            return true;
        }
        path.file_name()
            .map(|name| name.to_string_lossy())
            .is_some_and(|name| self.names.iter().any(|p| p.matches_with(&name, options)))
    }
}

/// Renders one template directory into a destination.
pub struct TreeWriter<'a> {
    pub renderer: &'a TemplateRenderer,
    pub context: &'a Context,
    pub excludes: &'a ExcludeSet,
    pub templates_suffix: &'a str,
    /// Destination-relative path of the answers artifact; a template file
    /// rendering to it is skipped
    pub answers_file: &'a Path,
}

impl TreeWriter<'_> {
    /// Render `template_dir` into `destination`.
    ///
    /// Returns the written files in visit order.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::RenderError`] for a malformed or undefined
    /// token in a name or a rendered file, and for a rendered path leaving
    /// the destination; I/O failures carry their path as context.
    pub fn write(&self, template_dir: &Path, destination: &Path) -> Result<Vec<WrittenFile>> {
        let mut written = Vec::new();
        let walker = WalkDir::new(template_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry
                    .path()
                    .strip_prefix(template_dir)
                    .map(|relative| !self.excludes.is_excluded(relative))
                    .unwrap_or(true)
            });

        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to walk template: {}", template_dir.display()))?;
            let relative = entry.path().strip_prefix(template_dir)?;
            let file_type = entry.file_type();

            let is_template = file_type.is_file()
                && !self.templates_suffix.is_empty()
                && relative.to_string_lossy().ends_with(self.templates_suffix);
            let Some(target) = self.render_path(relative, is_template)? else {
                tracing::debug!("Skipping {} (name rendered empty)", relative.display());
                continue;
            };

            if file_type.is_dir() {
                ensure_dir(&destination.join(&target))?;
            } else if file_type.is_file() {
                if target == self.answers_file {
                    tracing::debug!(
                        "Skipping {}: replaced by the answers file",
                        relative.display()
                    );
                    continue;
                }
                let action = self.write_file(
                    entry.path(),
                    relative,
                    &destination.join(&target),
                    is_template,
                )?;
                tracing::debug!("{:?} {} -> {}", action, relative.display(), target.display());
                written.push(WrittenFile {
                    path: target,
                    action,
                });
            } else {
                tracing::warn!("Skipping {}: not a regular file or directory", relative.display());
            }
        }

        Ok(written)
    }

    /// Render every component of `relative`; `None` when one renders empty.
    fn render_path(&self, relative: &Path, strip_suffix: bool) -> Result<Option<PathBuf>> {
        let mut target = PathBuf::new();
        let components: Vec<_> = relative.components().collect();
        let last = components.len().saturating_sub(1);

        for (index, component) in components.iter().enumerate() {
            let raw = component.as_os_str().to_string_lossy();
            let raw = if strip_suffix && index == last {
                raw.strip_suffix(self.templates_suffix).unwrap_or(raw.as_ref()).to_string()
            } else {
                raw.into_owned()
            };
            let rendered = self
                .renderer
                .render_str(&raw, self.context, Some(relative))
                .map_err(|e| render_error(relative, &e))?;
            let rendered = rendered.trim();
            if rendered.is_empty() {
                return Ok(None);
            }

            for part in Path::new(rendered).components() {
                match part {
                    Component::Normal(name) => target.push(name),
                    _ => {
                        return Err(StampError::RenderError {
                            path: relative.display().to_string(),
                            message: format!("rendered path '{rendered}' leaves the destination"),
                        }
                        .into());
                    }
                }
            }
        }

        Ok(Some(target))
    }

    fn write_file(
        &self,
        source: &Path,
        relative: &Path,
        target: &Path,
        is_template: bool,
    ) -> Result<FileAction> {
        let bytes =
            fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;

        let render = is_template || self.templates_suffix.is_empty();
        let (content, action) = match String::from_utf8(bytes) {
            Ok(text) if render => {
                let rendered = self
                    .renderer
                    .render_str(&text, self.context, Some(relative))
                    .map_err(|e| render_error(relative, &e))?;
                (rendered.into_bytes(), FileAction::Rendered)
            }
            Ok(text) => (text.into_bytes(), FileAction::Copied),
            Err(e) => (e.into_bytes(), FileAction::Copied),
        };

        atomic_write(target, &content)?;

        let metadata = fs::metadata(source)
            .with_context(|| format!("Failed to read metadata of {}", source.display()))?;
        copy_permissions(&metadata, target)?;
        Ok(action)
    }
}

fn render_error(relative: &Path, error: &TemplateError) -> StampError {
    StampError::RenderError {
        path: relative.display().to_string(),
        message: error.format_with_context(),
    }
}
