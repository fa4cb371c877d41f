//! Template source resolution
//!
//! A template is named by a local directory, a git URL or a hosting
//! shorthand (`gh:owner/repo`, `gl:owner/repo`). [`TemplateSource::parse`]
//! classifies the spelling and [`TemplateSource::resolve`] turns it into a
//! directory the generator can walk:
//!
//! - plain local directories are used in place;
//! - git sources are cloned into a scratch directory and the requested
//!   revision checked out (the highest semver tag when none is requested,
//!   `HEAD` when the repository has no such tag);
//! - a local repository with uncommitted changes is snapshotted: its working
//!   tree is laid over a clone and committed there, so the draft renders as
//!   `HEAD` without touching the original repository.
//!
//! The scratch directory lives as long as the returned [`ResolvedTemplate`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::StampError;
use crate::git::{GitRepo, is_git_repo, strip_auth_from_url};
use crate::utils::{copy_dir_all, resolve_path};

const GITHUB_PREFIX: &str = "gh:";
const GITLAB_PREFIX: &str = "gl:";
const GIT_URL_PREFIXES: &[&str] = &["https://", "http://", "git@", "ssh://", "git://", "file://"];
const SNAPSHOT_MESSAGE: &str = "stamp: snapshot of uncommitted changes";

/// How a template source is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A directory on disk that is not a git working tree.
    Directory,
    /// A git working tree on disk.
    LocalRepository,
    /// A remote (or `file://`) git URL.
    Remote,
}

/// A template location as given by the user, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    original: String,
    location: String,
    kind: SourceKind,
}

impl TemplateSource {
    /// Classify `spec`.
    ///
    /// Shorthands are expanded to their HTTPS URLs; local paths are
    /// tilde-expanded and made absolute.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::TemplateNotFound`] when a local path does not
    /// exist or is not a directory.
    pub fn parse(spec: &str) -> Result<Self> {
        let original = spec.to_string();

        if let Some(url) = expand_shorthand(spec) {
            return Ok(Self {
                original,
                location: url,
                kind: SourceKind::Remote,
            });
        }
        if is_git_url(spec) {
            return Ok(Self {
                original,
                location: spec.to_string(),
                kind: SourceKind::Remote,
            });
        }

        let path = resolve_path(spec)?;
        if !path.is_dir() {
            let reason = if path.exists() {
                "not a directory"
            } else {
                "no such file or directory"
            };
            return Err(StampError::TemplateNotFound {
                path: path.display().to_string(),
                reason: reason.to_string(),
            }
            .into());
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve template path: {}", path.display()))?;
        let kind = if is_git_repo(&path) {
            SourceKind::LocalRepository
        } else {
            SourceKind::Directory
        };

        Ok(Self {
            original,
            location: path.display().to_string(),
            kind,
        })
    }

    /// Expanded URL or absolute path.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// How the source is fetched.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Every spelling trust entries are matched against.
    pub fn trust_locations(&self) -> Vec<String> {
        let mut locations = vec![self.location.clone()];
        if self.original != self.location {
            locations.push(self.original.clone());
        }
        locations
    }

    /// Materialise the template at `vcs_ref`.
    ///
    /// `vcs_ref` is ignored (with a debug log) for plain directories.
    ///
    /// # Errors
    ///
    /// Propagates git failures: [`StampError::GitCloneFailed`],
    /// [`StampError::GitCheckoutFailed`], [`StampError::GitNotFound`].
    pub async fn resolve(&self, vcs_ref: Option<&str>) -> Result<ResolvedTemplate> {
        if self.kind == SourceKind::Directory {
            if let Some(reference) = vcs_ref {
                tracing::debug!(
                    "Ignoring vcs ref '{}': {} is not a git repository",
                    reference,
                    self.location
                );
            }
            return Ok(ResolvedTemplate {
                root: PathBuf::from(&self.location),
                src_path: self.location.clone(),
                vcs_ref: None,
                commit: None,
                _scratch: None,
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix("stamp-template-")
            .tempdir()
            .context("Failed to create scratch directory for template")?;
        let checkout_path = scratch.path().join("template");

        tracing::info!("Fetching template {}", strip_auth_from_url(&self.location));
        let repo = GitRepo::clone(&self.location, &checkout_path).await?;

        let snapshot = self.kind == SourceKind::LocalRepository
            && GitRepo::new(&self.location).is_dirty().await?;
        if snapshot {
            tracing::warn!(
                "Template {} has uncommitted changes; rendering them as HEAD",
                self.location
            );
            overlay_working_tree(Path::new(&self.location), &checkout_path)?;
            repo.commit_all(SNAPSHOT_MESSAGE).await?;
        }

        let reference = match vcs_ref {
            Some(reference) => Some(reference.to_string()),
            None if snapshot => None,
            None => latest_release_tag(&repo.list_tags().await?),
        };
        match &reference {
            Some(reference) => {
                tracing::debug!("Checking out {}", reference);
                repo.checkout(reference).await?;
            }
            None => tracing::debug!("Using HEAD of {}", strip_auth_from_url(&self.location)),
        }

        let commit = repo.describe().await?;
        tracing::debug!("Template resolved to {}", commit);

        Ok(ResolvedTemplate {
            root: checkout_path,
            src_path: strip_auth_from_url(&self.location),
            vcs_ref: Some(reference.unwrap_or_else(|| "HEAD".to_string())),
            commit: Some(commit),
            _scratch: Some(scratch),
        })
    }
}

/// A template checked out on disk.
///
/// Holds the scratch directory of git sources; dropping it removes the
/// checkout.
#[derive(Debug)]
pub struct ResolvedTemplate {
    root: PathBuf,
    src_path: String,
    vcs_ref: Option<String>,
    commit: Option<String>,
    _scratch: Option<TempDir>,
}

impl ResolvedTemplate {
    /// Directory holding the template files and schema.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source location recorded in the answers artifact.
    pub fn src_path(&self) -> &str {
        &self.src_path
    }

    /// Revision that was checked out, for git sources.
    pub fn vcs_ref(&self) -> Option<&str> {
        self.vcs_ref.as_deref()
    }

    /// `git describe` of the checked-out revision, for git sources.
    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }
}

/// Expand `gh:` and `gl:` shorthands.
///
/// ```
/// use stamp_cli::source::expand_shorthand;
///
/// assert_eq!(
///     expand_shorthand("gh:acme/python-template").as_deref(),
///     Some("https://github.com/acme/python-template.git")
/// );
/// assert_eq!(expand_shorthand("./template"), None);
/// ```
pub fn expand_shorthand(spec: &str) -> Option<String> {
    let (host, rest) = if let Some(rest) = spec.strip_prefix(GITHUB_PREFIX) {
        ("github.com", rest)
    } else if let Some(rest) = spec.strip_prefix(GITLAB_PREFIX) {
        ("gitlab.com", rest)
    } else {
        return None;
    };
    let rest = rest.trim_start_matches('/');
    let suffix = if rest.ends_with(".git") {
        ""
    } else {
        ".git"
    };
    Some(format!("https://{host}/{rest}{suffix}"))
}

/// Whether `spec` is spelled like a git URL.
pub fn is_git_url(spec: &str) -> bool {
    GIT_URL_PREFIXES.iter().any(|prefix| spec.starts_with(prefix))
        || spec.trim_end_matches('/').ends_with(".git")
}

/// Highest stable semver tag; a leading `v` is accepted.
pub fn latest_release_tag<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    tags.iter()
        .filter_map(|tag| {
            let tag = tag.as_ref();
            let version = semver::Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()?;
            version.pre.is_empty().then_some((version, tag))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, tag)| tag.to_string())
}

/// Replace the working tree of `clone` with that of `source`, keeping the
/// clone's `.git`.
fn overlay_working_tree(source: &Path, clone: &Path) -> Result<()> {
    for entry in fs::read_dir(clone)
        .with_context(|| format!("Failed to read directory: {}", clone.display()))?
    {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        let removed = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    for entry in fs::read_dir(source)
        .with_context(|| format!("Failed to read directory: {}", source.display()))?
    {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let target = clone.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}
