//! Template schema (`stamp.yml` / `stamp.yaml`).
//!
//! The schema sits at the template root. Keys starting with `_` configure
//! how the template is copied; every other key declares a question:
//!
//! ```yaml
//! _answers_file: .template-answers.yaml
//! _exclude: ["*.bak"]
//! _tasks: ["git init"]
//!
//! project_name:
//!   type: str
//!   help: Name of the project
//!   default: test-project
//! package_name:
//!   default: "{{ project_name | package_name }}"
//!   when: false
//! author: Jane Doe
//! ```
//!
//! Questions keep their declaration order, which is the order answers are
//! resolved in, so a default may reference any earlier answer.

mod question;

pub use question::{Choice, Question, QuestionType};
pub(crate) use question::yaml_to_plain_string;

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::{ALWAYS_EXCLUDED, DEFAULT_ANSWERS_FILE, DEFAULT_EXCLUDES, SCHEMA_FILE_NAMES};
use crate::core::StampError;
use crate::naming::is_identifier;
use crate::templating::UndefinedPolicy;

/// Settings keys understood by stamp, without their `_` prefix.
const KNOWN_SETTINGS: &[&str] = &[
    "answers_file",
    "subdirectory",
    "templates_suffix",
    "exclude",
    "undefined",
    "tasks",
    "message_after_copy",
    "min_version",
];

/// A post-render command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TaskSpec {
    /// `- git init`
    Command(String),
    /// `- command: git init` with an optional `when`
    Detailed {
        command: String,
        #[serde(default)]
        when: Option<serde_yaml::Value>,
    },
}

impl TaskSpec {
    /// The command template.
    pub fn command(&self) -> &str {
        match self {
            TaskSpec::Command(command)
            | TaskSpec::Detailed {
                command,
                ..
            } => command,
        }
    }

    /// The `when` clause, if any.
    pub fn when(&self) -> Option<&serde_yaml::Value> {
        match self {
            TaskSpec::Command(_) => None,
            TaskSpec::Detailed {
                when,
                ..
            } => when.as_ref(),
        }
    }
}

/// Copy settings declared with `_`-prefixed keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Answers artifact path, relative to the destination; may contain tokens
    pub answers_file: String,
    /// Render from this directory of the template instead of its root
    pub subdirectory: Option<PathBuf>,
    /// Only files with this suffix are rendered when non-empty
    pub templates_suffix: String,
    /// Replaces [`DEFAULT_EXCLUDES`] when present
    pub exclude: Option<Vec<String>>,
    pub undefined: UndefinedPolicy,
    pub tasks: Vec<TaskSpec>,
    pub message_after_copy: Option<String>,
    pub min_version: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            answers_file: DEFAULT_ANSWERS_FILE.to_string(),
            subdirectory: None,
            templates_suffix: String::new(),
            exclude: None,
            undefined: UndefinedPolicy::default(),
            tasks: Vec::new(),
            message_after_copy: None,
            min_version: None,
        }
    }
}

/// A parsed template schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSchema {
    /// Path of the schema file
    pub path: PathBuf,
    pub settings: Settings,
    /// Questions in declaration order
    pub questions: Vec<Question>,
}

impl TemplateSchema {
    /// Locate the schema file at `template_root`.
    pub fn find(template_root: &Path) -> Option<PathBuf> {
        SCHEMA_FILE_NAMES.iter().map(|name| template_root.join(name)).find(|path| path.is_file())
    }

    /// Load the schema of the template at `template_root`.
    ///
    /// # Errors
    ///
    /// - [`StampError::TemplateNotFound`] when no schema file exists
    /// - [`StampError::SchemaError`] when the file is malformed
    pub fn load(template_root: &Path) -> Result<Self> {
        let path = Self::find(template_root).ok_or_else(|| StampError::TemplateNotFound {
            path: template_root.display().to_string(),
            reason: format!("no {} found", SCHEMA_FILE_NAMES.join(" or ")),
        })?;

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template schema: {}", path.display()))?;

        let schema = Self::parse(&content, &path)?;
        tracing::debug!(
            "Loaded schema {} with {} question(s)",
            path.display(),
            schema.questions.len()
        );
        Ok(schema)
    }

    /// Parse schema `content` read from `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self, StampError> {
        let schema_error = |reason: String| StampError::SchemaError {
            file: path.display().to_string(),
            reason,
        };

        let document: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| schema_error(e.to_string()))?;
        let mapping = match document {
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => return Err(schema_error("top level must be a mapping".to_string())),
        };

        let mut settings = serde_yaml::Mapping::new();
        let mut questions = Vec::new();
        for (key, value) in mapping {
            let serde_yaml::Value::String(key) = key else {
                return Err(schema_error(format!(
                    "keys must be strings, found {}",
                    yaml_to_plain_string(&key)
                )));
            };

            if let Some(setting) = key.strip_prefix('_') {
                if KNOWN_SETTINGS.contains(&setting) {
                    settings.insert(serde_yaml::Value::String(setting.to_string()), value);
                } else {
                    tracing::warn!("Ignoring unknown schema setting '{}'", key);
                }
                continue;
            }

            if !is_identifier(&key) {
                return Err(schema_error(format!(
                    "question name '{key}' is not an identifier; use letters, digits and \
                     underscores (e.g. '{}')",
                    crate::naming::package_name(&key)
                )));
            }
            let question = Question::from_yaml(&key, value)
                .map_err(|reason| schema_error(format!("question '{key}': {reason}")))?;
            questions.push(question);
        }

        let settings: Settings = serde_yaml::from_value(serde_yaml::Value::Mapping(settings))
            .map_err(|e| schema_error(format!("settings: {e}")))?;

        let schema = Self {
            path: path.to_path_buf(),
            settings,
            questions,
        };
        schema.validate().map_err(schema_error)?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), String> {
        if !is_relative_inside(Path::new(&self.settings.answers_file)) {
            return Err(format!(
                "_answers_file must be a relative path inside the destination, got '{}'",
                self.settings.answers_file
            ));
        }
        if let Some(subdirectory) = &self.settings.subdirectory
            && !is_relative_inside(subdirectory)
        {
            return Err(format!(
                "_subdirectory must be a relative path inside the template, got '{}'",
                subdirectory.display()
            ));
        }
        if let Some(min_version) = &self.settings.min_version {
            semver::Version::parse(min_version.trim_start_matches('v'))
                .map_err(|e| format!("_min_version '{min_version}' is not a version: {e}"))?;
        }
        for question in &self.questions {
            if question.choices.is_empty() {
                continue;
            }
            for choice in &question.choices {
                let value = serde_json::to_value(&choice.value).map_err(|e| e.to_string())?;
                question.kind.coerce(&value).map_err(|reason| {
                    format!("choice '{}' of '{}': {reason}", choice.label, question.name)
                })?;
            }
        }
        Ok(())
    }

    /// Fail when this stamp is older than `_min_version`.
    pub fn check_min_version(&self) -> Result<(), StampError> {
        let Some(required) = &self.settings.min_version else {
            return Ok(());
        };
        let current = env!("CARGO_PKG_VERSION");
        let unsupported = || StampError::UnsupportedVersion {
            required: required.clone(),
            current: current.to_string(),
        };
        let required_version =
            semver::Version::parse(required.trim_start_matches('v')).map_err(|_| unsupported())?;
        let current_version = semver::Version::parse(current).map_err(|_| unsupported())?;
        if current_version < required_version {
            return Err(unsupported());
        }
        Ok(())
    }

    /// Question by name.
    pub fn question(&self, name: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.name == name)
    }

    /// Whether copying runs commands on the host.
    pub fn has_tasks(&self) -> bool {
        !self.settings.tasks.is_empty()
    }

    /// Directory whose contents are copied.
    pub fn template_dir(&self, template_root: &Path) -> PathBuf {
        match &self.settings.subdirectory {
            Some(subdirectory) => template_root.join(subdirectory),
            None => template_root.to_path_buf(),
        }
    }

    /// Exclude patterns in effect: `_exclude` or the defaults, plus the
    /// entries that are never copied.
    pub fn exclude_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = match &self.settings.exclude {
            Some(exclude) => exclude.clone(),
            None => DEFAULT_EXCLUDES.iter().map(|p| (*p).to_string()).collect(),
        };
        patterns.extend(ALWAYS_EXCLUDED.iter().map(|p| (*p).to_string()));
        if let Some(file_name) = self.path.file_name() {
            let file_name = file_name.to_string_lossy().into_owned();
            if !patterns.contains(&file_name) {
                patterns.push(file_name);
            }
        }
        patterns
    }
}

fn is_relative_inside(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
