//! Answer resolution and the answers artifact
//!
//! [`Answers::resolve`] walks the schema's questions in declaration order and
//! settles each one from, in priority order:
//!
//! 1. an explicit value passed by the caller (cast to the question type);
//! 2. the rendered default, when the question's `when` renders false;
//! 3. a default from the user configuration;
//! 4. the rendered schema default, when defaults are accepted.
//!
//! A question left without a value is a [`StampError::MissingVariable`].
//! Settled values are checked against `choices` and the `validator`
//! template ([`StampError::InvalidAnswer`]). Each answer joins the render
//! context as soon as it is settled, so later defaults can use it:
//!
//! ```yaml
//! project_name: test-project
//! package_name:
//!   default: "{{ project_name | package_name }}"
//!   when: false
//! ```
//!
//! The resolved map feeds the template context ([`Answers::context`]) and
//! the YAML artifact recorded in the destination ([`Answers::to_yaml`]).

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context as _, Result};
use serde_json::Value;
use tera::Context;

use crate::constants::{ANSWERS_FILE_HEADER, CONTEXT_META_KEY};
use crate::core::StampError;
use crate::schema::{Question, TemplateSchema, yaml_to_plain_string};
use crate::templating::{TemplateError, TemplateRenderer};

/// Caller-supplied inputs to answer resolution.
#[derive(Debug, Clone, Default)]
pub struct AnswerInputs {
    /// Explicit values, as typed on the command line
    pub data: BTreeMap<String, String>,
    /// Defaults from the user configuration
    pub user_defaults: BTreeMap<String, Value>,
    /// Accept schema defaults for unanswered questions
    pub use_defaults: bool,
}

/// Facts about the render exposed to templates as `_stamp`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderMeta {
    pub src_path: String,
    pub answers_file: String,
    pub vcs_ref: Option<String>,
    pub commit: Option<String>,
}

impl RenderMeta {
    fn to_json(&self) -> Value {
        serde_json::json!({
            "src_path": self.src_path,
            "answers_file": self.answers_file,
            "vcs_ref": self.vcs_ref,
            "commit": self.commit,
        })
    }
}

/// The resolved variable map of one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answers {
    /// Declared answers in declaration order
    values: Vec<(String, Value)>,
    /// Values passed for names the schema does not declare
    extra: BTreeMap<String, String>,
    secrets: HashSet<String>,
}

impl Answers {
    /// Resolve every question of `schema`.
    ///
    /// # Errors
    ///
    /// - [`StampError::MissingVariable`] when a question has no value
    /// - [`StampError::InvalidAnswer`] when a value fails casting, choices
    ///   or its validator
    /// - [`StampError::RenderError`] when a default, `when` or validator
    ///   template cannot be rendered
    pub fn resolve(
        schema: &TemplateSchema,
        inputs: &AnswerInputs,
        renderer: &TemplateRenderer,
    ) -> Result<Self, StampError> {
        let mut answers = Self::default();
        let mut context = Context::new();

        for (name, value) in &inputs.data {
            if schema.question(name).is_none() {
                tracing::debug!("'{}' is not declared by the template; passing it through", name);
                context.insert(name.as_str(), value);
                answers.extra.insert(name.clone(), value.clone());
            }
        }

        for question in &schema.questions {
            let value = resolve_question(question, inputs, renderer, &context, schema)?;
            tracing::debug!("Resolved {} = {}", question.name, value);
            context.insert(question.name.as_str(), &value);
            if question.secret {
                answers.secrets.insert(question.name.clone());
            }
            answers.values.push((question.name.clone(), value));
        }

        Ok(answers)
    }

    /// Value of a declared or passed-through variable.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .or_else(|| self.extra.get(name).map(|value| Value::String(value.clone())))
    }

    /// Declared answers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Render context: every answer plus the `_stamp` metadata object.
    pub fn context(&self, meta: &RenderMeta) -> Context {
        let mut context = Context::new();
        for (name, value) in &self.extra {
            context.insert(name.as_str(), value);
        }
        for (name, value) in &self.values {
            context.insert(name.as_str(), value);
        }
        context.insert(CONTEXT_META_KEY, &meta.to_json());
        context
    }

    /// The answers artifact.
    ///
    /// A header comment, `_commit` for git templates, `_src_path`, the
    /// non-secret answers in declaration order and finally passed-through
    /// values sorted by name.
    pub fn to_yaml(&self, meta: &RenderMeta) -> Result<String> {
        let mut mapping = serde_yaml::Mapping::new();
        if let Some(commit) = &meta.commit {
            mapping.insert("_commit".into(), commit.as_str().into());
        }
        mapping.insert("_src_path".into(), meta.src_path.as_str().into());

        for (name, value) in &self.values {
            if self.secrets.contains(name) {
                continue;
            }
            let value = serde_yaml::to_value(value)
                .with_context(|| format!("Failed to serialize answer '{name}'"))?;
            mapping.insert(name.as_str().into(), value);
        }
        for (name, value) in &self.extra {
            mapping.insert(name.as_str().into(), value.as_str().into());
        }

        let body = serde_yaml::to_string(&mapping).context("Failed to serialize answers")?;
        Ok(format!("{ANSWERS_FILE_HEADER}\n{body}"))
    }
}

fn resolve_question(
    question: &Question,
    inputs: &AnswerInputs,
    renderer: &TemplateRenderer,
    context: &Context,
    schema: &TemplateSchema,
) -> Result<Value, StampError> {
    let name = &question.name;
    let invalid = |reason: String| StampError::InvalidAnswer {
        name: name.clone(),
        reason,
    };

    if let Some(raw) = inputs.data.get(name) {
        let value = question.kind.cast_str(raw).map_err(invalid)?;
        return validate(question, value, renderer, context, schema);
    }

    if !is_asked(question, renderer, context, schema)? {
        // Skipped questions take their default without validation
        return match &question.default {
            Some(default) => render_default(question, default, renderer, context, schema),
            None => Ok(Value::Null),
        };
    }

    if let Some(value) = inputs.user_defaults.get(name) {
        let value = question.kind.coerce(value).map_err(invalid)?;
        return validate(question, value, renderer, context, schema);
    }

    match &question.default {
        Some(default) if inputs.use_defaults => {
            let value = render_default(question, default, renderer, context, schema)?;
            validate(question, value, renderer, context, schema)
        }
        _ => Err(StampError::MissingVariable {
            name: name.clone(),
        }),
    }
}

fn is_asked(
    question: &Question,
    renderer: &TemplateRenderer,
    context: &Context,
    schema: &TemplateSchema,
) -> Result<bool, StampError> {
    match &question.when {
        None => Ok(true),
        Some(serde_yaml::Value::Bool(asked)) => Ok(*asked),
        Some(serde_yaml::Value::String(expression)) => renderer
            .render_condition(expression, context, None)
            .map_err(|e| render_error(schema, &question.name, "when", &e)),
        Some(other) => Ok(crate::templating::is_truthy(&yaml_to_plain_string(other))),
    }
}

fn render_default(
    question: &Question,
    default: &serde_yaml::Value,
    renderer: &TemplateRenderer,
    context: &Context,
    schema: &TemplateSchema,
) -> Result<Value, StampError> {
    let invalid = |reason: String| StampError::InvalidAnswer {
        name: question.name.clone(),
        reason: format!("default: {reason}"),
    };
    match default {
        serde_yaml::Value::String(template) => {
            let rendered = renderer
                .render_str(template, context, None)
                .map_err(|e| render_error(schema, &question.name, "default", &e))?;
            question.kind.cast_str(&rendered).map_err(invalid)
        }
        other => {
            let json = serde_json::to_value(other).map_err(|e| invalid(e.to_string()))?;
            question.kind.coerce(&json).map_err(invalid)
        }
    }
}

fn validate(
    question: &Question,
    value: Value,
    renderer: &TemplateRenderer,
    context: &Context,
    schema: &TemplateSchema,
) -> Result<Value, StampError> {
    question.check_choice(&value).map_err(|reason| StampError::InvalidAnswer {
        name: question.name.clone(),
        reason,
    })?;

    if let Some(validator) = &question.validator {
        let mut scoped = context.clone();
        scoped.insert(question.name.as_str(), &value);
        let message = renderer
            .render_str(validator, &scoped, None)
            .map_err(|e| render_error(schema, &question.name, "validator", &e))?;
        let message = message.trim();
        if !message.is_empty() {
            return Err(StampError::InvalidAnswer {
                name: question.name.clone(),
                reason: message.to_string(),
            });
        }
    }
    Ok(value)
}

fn render_error(
    schema: &TemplateSchema,
    question: &str,
    field: &str,
    error: &TemplateError,
) -> StampError {
    StampError::RenderError {
        path: format!("{} ({question}.{field})", schema.path.display()),
        message: error.format_with_context(),
    }
}
