//! Structured template errors.
//!
//! Tera reports failures as a chain of strings. The renderer parses that
//! chain into a [`TemplateError`] so callers can show the offending line and
//! suggest close variable names.

use std::path::PathBuf;

/// A template failed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    VariableNotFound {
        variable: String,
        available_variables: Box<Vec<String>>,
        suggestions: Box<Vec<String>>,
        location: Box<ErrorLocation>,
    },

    SyntaxError {
        message: String,
        location: Box<ErrorLocation>,
    },
}

/// Where a template error happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    /// Template-relative path, when rendering a file or a file name
    pub file_path: Option<PathBuf>,
    /// Line number if available from Tera
    pub line_number: Option<usize>,
    /// Lines surrounding the error as (line number, text)
    pub context_lines: Option<Vec<(usize, String)>>,
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::VariableNotFound {
                variable,
                suggestions,
                ..
            } => {
                write!(f, "Template variable not found: '{variable}'")?;
                if !suggestions.is_empty() {
                    write!(f, " (did you mean '{}'?)", suggestions.join("', '"))?;
                }
                Ok(())
            }
            TemplateError::SyntaxError {
                message,
                ..
            } => write!(f, "Template syntax error: {message}"),
        }
    }
}

impl std::error::Error for TemplateError {}

impl TemplateError {
    /// The location attached to this error.
    pub fn location(&self) -> &ErrorLocation {
        match self {
            TemplateError::VariableNotFound {
                location,
                ..
            }
            | TemplateError::SyntaxError {
                location,
                ..
            } => location,
        }
    }

    /// Generate a multi-line message with the source excerpt and suggestions
    pub fn format_with_context(&self) -> String {
        match self {
            TemplateError::VariableNotFound {
                variable,
                available_variables,
                suggestions,
                location,
            } => format_variable_not_found_error(
                variable,
                available_variables,
                suggestions,
                location,
            ),
            TemplateError::SyntaxError {
                message,
                location,
            } => format_syntax_error(message, location),
        }
    }
}

fn format_location(msg: &mut String, location: &ErrorLocation) {
    if let Some(path) = &location.file_path {
        msg.push_str(&format!("File: {}\n", path.display()));
    }
    if let Some(line) = location.line_number {
        msg.push_str(&format!("Line: {line}\n"));
    }
    if let Some(lines) = &location.context_lines {
        msg.push('\n');
        for (number, text) in lines {
            let marker = if Some(*number) == location.line_number {
                ">"
            } else {
                " "
            };
            msg.push_str(&format!("{marker} {number:>4} | {text}\n"));
        }
    }
    msg.push('\n');
}

fn format_variable_not_found_error(
    variable: &str,
    available_variables: &[String],
    suggestions: &[String],
    location: &ErrorLocation,
) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Variable Not Found\n\n");
    msg.push_str(&format!("Variable: {variable}\n"));
    format_location(&mut msg, location);

    if !suggestions.is_empty() {
        msg.push_str("Did you mean one of these?\n");
        for suggestion in suggestions {
            msg.push_str(&format!("  - {suggestion}\n"));
        }
        msg.push('\n');
    }

    if !available_variables.is_empty() {
        msg.push_str("Available variables in this context:\n");
        for var in available_variables.iter().take(10) {
            msg.push_str(&format!("  {var}\n"));
        }
        if available_variables.len() > 10 {
            msg.push_str(&format!("  ... and {} more\n", available_variables.len() - 10));
        }
        msg.push('\n');
    }

    msg.push_str(
        "SUGGESTION: Declare the variable in the template schema, pass it with -d, \
         or set `_undefined: keep` to leave unknown tokens untouched.\n",
    );

    msg
}

fn format_syntax_error(message: &str, location: &ErrorLocation) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Syntax Error\n\n");
    msg.push_str(&format!("Error: {message}\n"));
    format_location(&mut msg, location);

    msg.push_str("SUGGESTION: Check template syntax for unclosed tags or invalid expressions.\n");
    msg.push_str("Common issues:\n");
    msg.push_str("  - Unclosed {{ }} or {% %} delimiters\n");
    msg.push_str("  - Invalid filter names\n");
    msg.push_str("  - Literal braces that need {% raw %} ... {% endraw %}\n");

    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> ErrorLocation {
        ErrorLocation {
            file_path: Some(PathBuf::from("README.md")),
            line_number: Some(2),
            context_lines: Some(vec![(1, "# Title".into()), (2, "{{ projct_name }}".into())]),
        }
    }

    #[test]
    fn test_display_includes_suggestions() {
        let error = TemplateError::VariableNotFound {
            variable: "projct_name".into(),
            available_variables: Box::new(vec!["project_name".into()]),
            suggestions: Box::new(vec!["project_name".into()]),
            location: Box::new(location()),
        };
        assert_eq!(
            error.to_string(),
            "Template variable not found: 'projct_name' (did you mean 'project_name'?)"
        );
    }

    #[test]
    fn test_format_with_context_marks_error_line() {
        let error = TemplateError::VariableNotFound {
            variable: "projct_name".into(),
            available_variables: Box::new(vec!["project_name".into()]),
            suggestions: Box::new(vec![]),
            location: Box::new(location()),
        };
        let formatted = error.format_with_context();
        assert!(formatted.contains("File: README.md"));
        assert!(formatted.contains(">    2 | {{ projct_name }}"));
        assert!(formatted.contains("  project_name"));
    }

    #[test]
    fn test_syntax_error_formatting() {
        let error = TemplateError::SyntaxError {
            message: "unexpected end of template".into(),
            location: Box::new(ErrorLocation::default()),
        };
        assert!(error.to_string().starts_with("Template syntax error"));
        assert!(error.format_with_context().contains("Unclosed"));
    }
}
