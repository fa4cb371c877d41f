//! Questions declared by a template schema and the casting of their answers.

use serde::{Deserialize, Serialize};

/// Value type of a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    #[serde(alias = "string")]
    Str,
    #[serde(alias = "integer")]
    Int,
    Float,
    #[serde(alias = "boolean")]
    Bool,
}

impl QuestionType {
    /// Infer the type from a default value when `type` is omitted.
    pub fn infer(default: Option<&serde_yaml::Value>) -> Self {
        match default {
            Some(serde_yaml::Value::Bool(_)) => Self::Bool,
            Some(serde_yaml::Value::Number(n)) if n.is_i64() || n.is_u64() => Self::Int,
            Some(serde_yaml::Value::Number(_)) => Self::Float,
            _ => Self::Str,
        }
    }

    /// Cast a string answer, as passed on the command line, to this type.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the text is not a valid value.
    pub fn cast_str(self, raw: &str) -> Result<serde_json::Value, String> {
        let trimmed = raw.trim();
        match self {
            Self::Str => Ok(serde_json::Value::String(raw.to_string())),
            Self::Int => trimmed
                .parse::<i64>()
                .map(serde_json::Value::from)
                .map_err(|_| format!("expected an integer, got '{raw}'")),
            Self::Float => trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .ok_or_else(|| format!("expected a number, got '{raw}'")),
            Self::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" | "1" => Ok(serde_json::Value::Bool(true)),
                "false" | "no" | "n" | "off" | "0" => Ok(serde_json::Value::Bool(false)),
                _ => Err(format!("expected a boolean, got '{raw}'")),
            },
        }
    }

    /// Coerce an already structured value to this type.
    ///
    /// Strings go through [`cast_str`](Self::cast_str); numbers and booleans
    /// are accepted where they fit.
    pub fn coerce(self, value: &serde_json::Value) -> Result<serde_json::Value, String> {
        use serde_json::Value;

        match (self, value) {
            (_, Value::String(s)) => self.cast_str(s),
            (Self::Str, Value::Null) => Ok(Value::String(String::new())),
            (Self::Str, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (Self::Str, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (Self::Int, Value::Number(n)) if n.is_i64() => Ok(value.clone()),
            (Self::Float, Value::Number(n)) => n
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected a number, got {n}")),
            (Self::Bool, Value::Bool(_)) => Ok(value.clone()),
            (kind, other) => Err(format!("expected {}, got {other}", kind.describe())),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Str => "a string",
            Self::Int => "an integer",
            Self::Float => "a number",
            Self::Bool => "a boolean",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// One allowed value of a multiple-choice question.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub value: serde_yaml::Value,
}

/// `choices:` accepts a plain list or a mapping of label to value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ChoicesSpec {
    List(Vec<serde_yaml::Value>),
    Labeled(serde_yaml::Mapping),
}

/// Long form of a question as written in the schema file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct QuestionSpec {
    #[serde(rename = "type")]
    kind: Option<QuestionType>,
    help: Option<String>,
    default: Option<serde_yaml::Value>,
    when: Option<serde_yaml::Value>,
    choices: Option<ChoicesSpec>,
    #[serde(default)]
    secret: bool,
    validator: Option<String>,
}

/// A template variable declared in the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub name: String,
    pub kind: QuestionType,
    pub help: Option<String>,
    /// Raw default; strings are rendered against earlier answers
    pub default: Option<serde_yaml::Value>,
    /// `false`, `true` or a template rendering to a boolean
    pub when: Option<serde_yaml::Value>,
    pub choices: Vec<Choice>,
    /// Secret answers are never written to the answers file
    pub secret: bool,
    /// Template rendering to an error message, empty when the answer is valid
    pub validator: Option<String>,
}

impl Question {
    /// Build a question from its schema entry.
    ///
    /// A mapping is the long form; any other value is the default of a
    /// question with an inferred type.
    pub(crate) fn from_yaml(name: &str, value: serde_yaml::Value) -> Result<Self, String> {
        let spec = match value {
            serde_yaml::Value::Mapping(_) => {
                serde_yaml::from_value::<QuestionSpec>(value).map_err(|e| e.to_string())?
            }
            other => QuestionSpec {
                default: Some(other),
                ..QuestionSpec::default()
            },
        };

        let kind = spec.kind.unwrap_or_else(|| QuestionType::infer(spec.default.as_ref()));
        let choices = match spec.choices {
            None => Vec::new(),
            Some(ChoicesSpec::List(values)) => values
                .into_iter()
                .map(|value| Choice {
                    label: yaml_to_plain_string(&value),
                    value,
                })
                .collect(),
            Some(ChoicesSpec::Labeled(mapping)) => mapping
                .into_iter()
                .map(|(label, value)| Choice {
                    label: yaml_to_plain_string(&label),
                    value,
                })
                .collect(),
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            help: spec.help,
            default: spec.default,
            when: spec.when,
            choices,
            secret: spec.secret,
            validator: spec.validator,
        })
    }

    /// Whether the question is never asked and always takes its default.
    pub fn is_derived(&self) -> bool {
        matches!(self.when, Some(serde_yaml::Value::Bool(false)))
    }

    /// Check `value` against the declared choices.
    pub fn check_choice(&self, value: &serde_json::Value) -> Result<(), String> {
        if self.choices.is_empty() {
            return Ok(());
        }
        let allowed: Vec<serde_json::Value> = self
            .choices
            .iter()
            .filter_map(|choice| {
                serde_json::to_value(&choice.value)
                    .ok()
                    .and_then(|v| self.kind.coerce(&v).ok())
            })
            .collect();
        if allowed.contains(value) {
            Ok(())
        } else {
            let labels: Vec<&str> = self.choices.iter().map(|c| c.label.as_str()).collect();
            Err(format!("{value} is not one of: {}", labels.join(", ")))
        }
    }
}

/// Render a scalar YAML value as plain text.
pub(crate) fn yaml_to_plain_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim_end().to_string(),
    }
}
