//! Template rendering engine with Tera.
//!
//! [`TemplateRenderer`] wraps Tera with the stamp filters, the hyphenated
//! token rewrite and the undefined-variable policy. It renders both file
//! contents and path components.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use strsim::levenshtein;
use tera::{Context as TeraContext, Tera};

use super::error::{ErrorLocation, TemplateError};
use super::filters;

/// Maximum allowed Levenshtein distance as a percentage of target length for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Number of lines shown on each side of an error line.
const CONTEXT_LINE_COUNT: usize = 2;

/// Names that resolve inside Tera without being in the context.
const TERA_BUILTIN_NAMES: &[&str] =
    &["loop", "true", "false", "True", "False", "none", "__tera_context"];

/// Bare `{{ some-name }}` expression.
pub(crate) static HYPHENATED_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\{\{-?\s*)([A-Za-z_][A-Za-z0-9_]*(?:-[A-Za-z0-9_]+)+)(\s*-?\}\})")
        .expect("hyphenated token pattern is valid")
});

/// Any `{{ .. }}` expression, capturing its root variable.
pub(crate) static EXPRESSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{-?\s*([A-Za-z_][A-Za-z0-9_]*(?:-[A-Za-z0-9_]+)*)(?:\s*[.|\[][^}]*|\s+[^}]*)?\}\}",
    )
    .expect("expression token pattern is valid")
});

/// Names bound by `{% for %}` or `{% set %}`.
pub(crate) static BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{%-?\s*(?:for\s+([A-Za-z_]\w*)(?:\s*,\s*([A-Za-z_]\w*))?\s+in\b|set(?:_global)?\s+([A-Za-z_]\w*)\s*=)",
    )
    .expect("binding pattern is valid")
});

pub(crate) static RAW_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}")
        .expect("raw block pattern is valid")
});

pub(crate) static VARIABLE_NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Variable `([^`]+)` not found").expect("variable pattern is valid")
});

/// Tera parse error position ("--> 3:7")
pub(crate) static LINE_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+):(\d+)").expect("line pattern is valid"));

/// What to do with tokens naming variables absent from the context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedPolicy {
    /// Fail the render.
    #[default]
    Strict,
    /// Leave the token in the output verbatim.
    Keep,
}

/// Template renderer with Tera engine and custom filters.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    undefined: UndefinedPolicy,
}

impl TemplateRenderer {
    /// Create a renderer applying `undefined` to unknown tokens.
    pub fn new(undefined: UndefinedPolicy) -> Self {
        Self {
            undefined,
        }
    }

    /// Render `template_content` with `context`.
    ///
    /// Content without any Tera delimiter is returned unchanged. Otherwise
    /// bare hyphenated tokens are rewritten to their underscore form when
    /// that variable exists, tokens naming unknown variables are protected
    /// under [`UndefinedPolicy::Keep`], and the result goes through a fresh
    /// Tera instance.
    ///
    /// `source` only feeds error locations.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::VariableNotFound`] for unknown variables
    /// under the strict policy and [`TemplateError::SyntaxError`] for any
    /// other Tera failure.
    pub fn render_str(
        &self,
        template_content: &str,
        context: &TeraContext,
        source: Option<&Path>,
    ) -> Result<String, TemplateError> {
        if !contains_template_syntax(template_content) {
            return Ok(template_content.to_string());
        }

        let normalized = normalize_hyphenated_tokens(template_content, context);
        let prepared = match self.undefined {
            UndefinedPolicy::Strict => normalized,
            UndefinedPolicy::Keep => protect_undefined_tokens(&normalized, context),
        };

        // A fresh instance per render keeps filters free of shared state
        let mut tera = Tera::default();
        filters::register_filters(&mut tera);

        tera.render_str(&prepared, context)
            .map_err(|e| Self::parse_tera_error(&e, &prepared, context, source))
    }

    /// Render a boolean expression such as a `when` clause.
    ///
    /// The rendered text is interpreted with [`is_truthy`].
    pub fn render_condition(
        &self,
        expression: &str,
        context: &TeraContext,
        source: Option<&Path>,
    ) -> Result<bool, TemplateError> {
        let rendered = self.render_str(expression, context, source)?;
        Ok(is_truthy(&rendered))
    }

    /// Parse a Tera error into a structured TemplateError
    fn parse_tera_error(
        error: &tera::Error,
        template_content: &str,
        context: &TeraContext,
        source: Option<&Path>,
    ) -> TemplateError {
        let messages = error_chain(error);
        let line_number = messages.iter().find_map(|m| extract_line_number(m));
        let context_lines = line_number
            .map(|line| extract_context_lines(template_content, line, CONTEXT_LINE_COUNT))
            .filter(|lines| !lines.is_empty());
        let location = Box::new(ErrorLocation {
            file_path: source.map(Path::to_path_buf),
            line_number,
            context_lines,
        });

        if let Some(variable) = messages.iter().find_map(|m| extract_variable_name(m)) {
            let available_variables = extract_available_variables(context);
            let suggestions = find_similar_variables(&variable, &available_variables);
            return TemplateError::VariableNotFound {
                variable,
                available_variables: Box::new(available_variables),
                suggestions: Box::new(suggestions),
                location,
            };
        }

        TemplateError::SyntaxError {
            message: Self::format_tera_error(&messages),
            location,
        }
    }

    /// Join an error chain into one line, dropping Tera's internal template name.
    fn format_tera_error(messages: &[String]) -> String {
        let cleaned: Vec<String> = messages
            .iter()
            .map(|msg| {
                msg.replace("while rendering '__tera_one_off'", "")
                    .replace("Failed to render '__tera_one_off'", "")
                    .replace("Failed to parse '__tera_one_off'", "")
                    .replace("'__tera_one_off'", "template")
                    .trim()
                    .to_string()
            })
            .filter(|msg| !msg.is_empty())
            .collect();

        if cleaned.is_empty() {
            "template could not be rendered".to_string()
        } else {
            cleaned.join(": ")
        }
    }
}

/// Whether `content` contains any Tera delimiter.
pub fn contains_template_syntax(content: &str) -> bool {
    content.contains("{{") || content.contains("{%") || content.contains("{#")
}

/// Interpret rendered text as a boolean.
///
/// Empty output and the usual spellings of false are false; anything else
/// is true.
pub fn is_truthy(rendered: &str) -> bool {
    !matches!(
        rendered.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "no" | "n" | "off" | "0" | "none" | "null"
    )
}

/// Rewrite `{{ some-name }}` to `{{ some_name }}` when `some_name` is in the context.
///
/// Only bare tokens are rewritten; expressions with filters or operators
/// are left alone.
pub(crate) fn normalize_hyphenated_tokens(content: &str, context: &TeraContext) -> String {
    HYPHENATED_TOKEN
        .replace_all(content, |caps: &Captures<'_>| {
            let candidate = caps[2].replace('-', "_");
            if context.contains_key(&candidate) {
                tracing::debug!("Resolved hyphenated token '{}' to '{}'", &caps[2], candidate);
                format!("{}{}{}", &caps[1], candidate, &caps[3])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Wrap expression tokens whose root variable is unknown in `{% raw %}`.
///
/// Names bound by `{% for %}` and `{% set %}` inside the same template count
/// as known.
pub(crate) fn protect_undefined_tokens(content: &str, context: &TeraContext) -> String {
    let bound: BTreeSet<&str> = BINDING
        .captures_iter(content)
        .flat_map(|caps| {
            [caps.get(1), caps.get(2), caps.get(3)]
                .into_iter()
                .flatten()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
        })
        .collect();

    let protect = |segment: &str| {
        EXPRESSION_TOKEN
            .replace_all(segment, |caps: &Captures<'_>| {
                let root = &caps[1];
                let known = !root.contains('-')
                    && (context.contains_key(root)
                        || bound.contains(root)
                        || TERA_BUILTIN_NAMES.contains(&root));
                if known {
                    caps[0].to_string()
                } else {
                    tracing::debug!("Keeping undefined token '{}' verbatim", &caps[0]);
                    format!("{{% raw %}}{}{{% endraw %}}", &caps[0])
                }
            })
            .into_owned()
    };

    // Existing raw blocks are already verbatim
    let mut result = String::with_capacity(content.len());
    let mut last = 0;
    for raw in RAW_BLOCK.find_iter(content) {
        result.push_str(&protect(&content[last..raw.start()]));
        result.push_str(raw.as_str());
        last = raw.end();
    }
    result.push_str(&protect(&content[last..]));
    result
}

/// Collect the message of every error in the chain, outermost first.
fn error_chain(error: &tera::Error) -> Vec<String> {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }
    messages
}

/// Extract variable name from "Variable `foo` not found" message
fn extract_variable_name(error_msg: &str) -> Option<String> {
    VARIABLE_NOT_FOUND
        .captures(error_msg)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract line number from a Tera parse error ("--> 3:7")
fn extract_line_number(error_msg: &str) -> Option<usize> {
    LINE_COLUMN
        .captures(error_msg)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Top-level keys of the context, sorted
fn extract_available_variables(context: &TeraContext) -> Vec<String> {
    match context.clone().into_json() {
        serde_json::Value::Object(map) => {
            let mut vars: Vec<String> = map.keys().cloned().collect();
            vars.sort();
            vars
        }
        _ => Vec::new(),
    }
}

/// Find similar variable names using Levenshtein distance
fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
    // Tera reports `{{ project-name }}` as a missing `project`
    let target = target.split('.').next().unwrap_or(target);
    let mut scored: Vec<_> = available
        .iter()
        .map(|var| (var.clone(), levenshtein(target, var)))
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .collect();

    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    scored.into_iter().take(3).map(|(var, _)| var).collect()
}

/// Lines around a 1-indexed `error_line`, with their line numbers
fn extract_context_lines(
    content: &str,
    error_line: usize,
    context_size: usize,
) -> Vec<(usize, String)> {
    let lines: Vec<&str> = content.lines().collect();
    if error_line == 0 || error_line > lines.len() {
        return Vec::new();
    }

    let start = error_line.saturating_sub(context_size + 1);
    let end = (error_line + context_size).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(idx, line)| (start + idx + 1, (*line).to_string()))
        .collect()
}
