//! Project generation: the `copy` operation.
//!
//! [`run_copy`] renders a template into a new project directory. The steps
//! run strictly in this order, so every check that can fail without side
//! effects happens before the first write:
//!
//! 1. resolve the template source (local directory or git revision);
//! 2. load the schema and check `_min_version`;
//! 3. refuse templates declaring `_tasks` unless unsafe operations are
//!    allowed or the source is trusted;
//! 4. require a missing or empty destination;
//! 5. resolve the answers;
//! 6. render the template tree;
//! 7. write the answers artifact;
//! 8. run the tasks.
//!
//! When a later step fails and the destination did not exist before the
//! call, the partial project is removed (unless disabled with
//! [`RenderRequest::cleanup_on_error`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use stamp_cli::generator::{RenderRequest, run_copy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let outcome = run_copy(
//!     RenderRequest::new("gh:acme/python-template", "./my-cool-app")
//!         .data("project_name", "my-cool-app")
//!         .use_defaults(true),
//! )
//! .await?;
//! println!("wrote {} files", outcome.files.len());
//! # Ok(())
//! # }
//! ```

pub mod tasks;
pub mod walker;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::answers::{AnswerInputs, Answers, RenderMeta};
use crate::config::GlobalConfig;
use crate::core::StampError;
use crate::schema::TemplateSchema;
use crate::source::{ResolvedTemplate, TemplateSource};
use crate::templating::TemplateRenderer;
use crate::utils::{atomic_write, dir_is_empty, ensure_dir};
use walker::{ExcludeSet, TreeWriter};

/// Inputs of one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Local path, git URL or `gh:`/`gl:` shorthand
    pub template: String,
    pub destination: PathBuf,
    /// Explicit answers, cast to each question's type
    pub data: BTreeMap<String, String>,
    /// Accept schema defaults for unanswered questions
    pub use_defaults: bool,
    /// Permit `_tasks`
    pub allow_unsafe: bool,
    /// Template revision; the latest release tag when unset
    pub vcs_ref: Option<String>,
    /// User defaults and trusted locations
    pub config: GlobalConfig,
    /// Remove a destination created by this call when rendering fails
    pub cleanup_on_error: bool,
}

impl RenderRequest {
    /// Render `template` into `destination` with no answers and defaults off.
    pub fn new(template: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            destination: destination.into(),
            data: BTreeMap::new(),
            use_defaults: false,
            allow_unsafe: false,
            vcs_ref: None,
            config: GlobalConfig::default(),
            cleanup_on_error: true,
        }
    }

    /// Set one answer.
    pub fn data(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Set several answers; later values win.
    pub fn data_map<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.data.extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn use_defaults(mut self, use_defaults: bool) -> Self {
        self.use_defaults = use_defaults;
        self
    }

    pub fn allow_unsafe(mut self, allow_unsafe: bool) -> Self {
        self.allow_unsafe = allow_unsafe;
        self
    }

    pub fn vcs_ref(mut self, vcs_ref: Option<String>) -> Self {
        self.vcs_ref = vcs_ref;
        self
    }

    pub fn config(mut self, config: GlobalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.cleanup_on_error = cleanup;
        self
    }
}

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub destination: PathBuf,
    pub answers: Answers,
    /// Destination-relative paths of every file written, answers file last
    pub files: Vec<PathBuf>,
    /// `git describe` of the template revision, for git templates
    pub commit: Option<String>,
    /// Rendered `_message_after_copy`
    pub message_after_copy: Option<String>,
    /// Rendered commands of the tasks that ran
    pub tasks_run: Vec<String>,
}

/// Render a template into a new project directory.
///
/// # Errors
///
/// Every failure carries a [`StampError`] reachable with
/// `downcast_ref`: [`TemplateNotFound`](StampError::TemplateNotFound),
/// [`SchemaError`](StampError::SchemaError),
/// [`UnsupportedVersion`](StampError::UnsupportedVersion),
/// [`PolicyError`](StampError::PolicyError),
/// [`DestinationNotEmpty`](StampError::DestinationNotEmpty),
/// [`MissingVariable`](StampError::MissingVariable),
/// [`InvalidAnswer`](StampError::InvalidAnswer),
/// [`RenderError`](StampError::RenderError),
/// [`TaskFailed`](StampError::TaskFailed) and the git errors; plain I/O
/// failures carry the path involved as context.
pub async fn run_copy(request: RenderRequest) -> Result<RenderOutcome> {
    let source = TemplateSource::parse(&request.template)?;
    tracing::debug!("Template source {} ({:?})", source.location(), source.kind());
    let template = source.resolve(request.vcs_ref.as_deref()).await?;

    let schema = TemplateSchema::load(template.root())?;
    schema.check_min_version()?;

    if schema.has_tasks() && !request.allow_unsafe {
        if request.config.is_trusted(&source.trust_locations()) {
            tracing::debug!("{} is trusted; tasks allowed", source.location());
        } else {
            return Err(StampError::PolicyError {
                reason: format!(
                    "template declares {} task(s) that run commands on this machine",
                    schema.settings.tasks.len()
                ),
            }
            .into());
        }
    }

    let destination = &request.destination;
    let existed = destination.exists();
    if !dir_is_empty(destination)? {
        return Err(StampError::DestinationNotEmpty {
            path: destination.display().to_string(),
        }
        .into());
    }

    let renderer = TemplateRenderer::new(schema.settings.undefined);
    let inputs = AnswerInputs {
        data: request.data.clone(),
        user_defaults: request.config.default_answers(),
        use_defaults: request.use_defaults,
    };
    let answers = Answers::resolve(&schema, &inputs, &renderer)?;

    tracing::info!(
        "Rendering {} into {}",
        template.src_path(),
        destination.display()
    );
    let result = write_project(&schema, &template, &answers, &renderer, destination).await;

    match result {
        Ok((files, message_after_copy, tasks_run)) => {
            tracing::info!("Wrote {} files to {}", files.len(), destination.display());
            Ok(RenderOutcome {
                destination: destination.clone(),
                answers,
                files,
                commit: template.commit().map(str::to_string),
                message_after_copy,
                tasks_run,
            })
        }
        Err(error) => {
            if !existed && request.cleanup_on_error && destination.exists() {
                tracing::debug!("Removing partially rendered {}", destination.display());
                if let Err(e) = tokio::fs::remove_dir_all(destination).await {
                    tracing::warn!("Failed to remove {}: {}", destination.display(), e);
                }
            }
            Err(error)
        }
    }
}

type ProjectWrite = (Vec<PathBuf>, Option<String>, Vec<String>);

async fn write_project(
    schema: &TemplateSchema,
    template: &ResolvedTemplate,
    answers: &Answers,
    renderer: &TemplateRenderer,
    destination: &Path,
) -> Result<ProjectWrite> {
    let mut meta = RenderMeta {
        src_path: template.src_path().to_string(),
        answers_file: schema.settings.answers_file.clone(),
        vcs_ref: template.vcs_ref().map(str::to_string),
        commit: template.commit().map(str::to_string),
    };
    let answers_file = render_answers_path(schema, answers, &meta, renderer)?;
    meta.answers_file = answers_file.to_string_lossy().replace('\\', "/");
    let context = answers.context(&meta);

    let template_dir = schema.template_dir(template.root());
    if !template_dir.is_dir() {
        return Err(StampError::TemplateNotFound {
            path: template_dir.display().to_string(),
            reason: "_subdirectory does not exist".to_string(),
        }
        .into());
    }

    ensure_dir(destination)?;
    let excludes = ExcludeSet::new(&schema.exclude_patterns(), &schema.path)?;
    let written = TreeWriter {
        renderer,
        context: &context,
        excludes: &excludes,
        templates_suffix: &schema.settings.templates_suffix,
        answers_file: &answers_file,
    }
    .write(&template_dir, destination)?;

    let mut files: Vec<PathBuf> = written.into_iter().map(|file| file.path).collect();
    atomic_write(&destination.join(&answers_file), answers.to_yaml(&meta)?.as_bytes())
        .with_context(|| format!("Failed to write answers file {}", answers_file.display()))?;
    files.push(answers_file);

    let tasks_run =
        tasks::run_tasks(&schema.settings.tasks, renderer, &context, destination).await?;

    let message = match &schema.settings.message_after_copy {
        Some(message) => Some(renderer.render_str(message, &context, None).map_err(|e| {
            StampError::RenderError {
                path: "_message_after_copy".to_string(),
                message: e.format_with_context(),
            }
        })?),
        None => None,
    };

    Ok((files, message, tasks_run))
}

/// Render `_answers_file` and make sure it stays inside the destination.
fn render_answers_path(
    schema: &TemplateSchema,
    answers: &Answers,
    meta: &RenderMeta,
    renderer: &TemplateRenderer,
) -> Result<PathBuf, StampError> {
    let raw = &schema.settings.answers_file;
    let rendered = renderer.render_str(raw, &answers.context(meta), None).map_err(|e| {
        StampError::RenderError {
            path: "_answers_file".to_string(),
            message: e.format_with_context(),
        }
    })?;
    let path = PathBuf::from(rendered.trim());
    let inside = !path.as_os_str().is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if !inside {
        return Err(StampError::RenderError {
            path: "_answers_file".to_string(),
            message: format!("'{}' is not a path inside the destination", path.display()),
        });
    }
    Ok(path)
}
