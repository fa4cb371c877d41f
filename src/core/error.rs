//! Error handling for stamp
//!
//! This module provides the error taxonomy of the template renderer and the
//! user-friendly reporting used by the CLI. The error system is designed around
//! two core principles:
//! 1. **Strongly-typed errors** so callers can tell failure kinds apart
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`StampError`] - Enumerated error types for every failure of a render
//! - [`ErrorContext`] - Wrapper that adds details and a suggestion for display
//!
//! Errors travel inside [`anyhow::Error`]; callers recover the kind with
//! `downcast_ref::<StampError>()`:
//!
//! ```rust,no_run
//! use stamp_cli::core::StampError;
//!
//! fn classify(err: &anyhow::Error) -> &'static str {
//!     match err.downcast_ref::<StampError>() {
//!         Some(StampError::MissingVariable { .. }) => "missing variable",
//!         Some(StampError::PolicyError { .. }) => "unsafe template",
//!         Some(_) => "other render failure",
//!         None => "unexpected",
//!     }
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for stamp operations
///
/// # Error Categories
///
/// ## Render contract
/// - [`TemplateNotFound`] - Template source or its schema is missing
/// - [`DestinationNotEmpty`] - Destination already holds files
/// - [`MissingVariable`] - A question has no value and no usable default
/// - [`PolicyError`] - Template requires unsafe operations that were not allowed
/// - [`RenderError`] - Malformed placeholder syntax or undeclared token
///
/// ## Template definition
/// - [`SchemaError`] - The schema file is malformed
/// - [`InvalidAnswer`] - A value failed casting, `choices` or its validator
/// - [`UnsupportedVersion`] - Template requires a newer stamp
/// - [`TaskFailed`] - A post-render task exited unsuccessfully
///
/// ## Git
/// - [`GitNotFound`], [`GitCommandError`], [`GitCloneFailed`], [`GitCheckoutFailed`]
///
/// [`TemplateNotFound`]: StampError::TemplateNotFound
/// [`DestinationNotEmpty`]: StampError::DestinationNotEmpty
/// [`MissingVariable`]: StampError::MissingVariable
/// [`PolicyError`]: StampError::PolicyError
/// [`RenderError`]: StampError::RenderError
/// [`SchemaError`]: StampError::SchemaError
/// [`InvalidAnswer`]: StampError::InvalidAnswer
/// [`UnsupportedVersion`]: StampError::UnsupportedVersion
/// [`TaskFailed`]: StampError::TaskFailed
/// [`GitNotFound`]: StampError::GitNotFound
/// [`GitCommandError`]: StampError::GitCommandError
/// [`GitCloneFailed`]: StampError::GitCloneFailed
/// [`GitCheckoutFailed`]: StampError::GitCheckoutFailed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StampError {
    /// Template source could not be located or has no schema file
    #[error("Template not found: {path} ({reason})")]
    TemplateNotFound {
        /// Template path or URL as given by the caller
        path: String,
        /// Why the template was rejected
        reason: String,
    },

    /// Destination exists and is not an empty directory
    #[error("Destination is not empty: {path}")]
    DestinationNotEmpty {
        /// Destination path
        path: String,
    },

    /// A question could not be resolved
    ///
    /// Raised when no value was passed, defaults are disabled (or the question
    /// declares none) and no user default exists.
    #[error("Missing value for template variable '{name}'")]
    MissingVariable {
        /// Question name
        name: String,
    },

    /// The template asks for something the caller did not permit
    #[error("Unsafe template refused: {reason}")]
    PolicyError {
        /// Description of the refused operation
        reason: String,
    },

    /// Rendering a file name or file content failed
    #[error("Failed to render '{path}': {message}")]
    RenderError {
        /// Template-relative path of the file being rendered
        path: String,
        /// Formatted template error
        message: String,
    },

    /// The schema file is malformed
    #[error("Invalid template schema {file}: {reason}")]
    SchemaError {
        /// Schema file path
        file: String,
        /// Specific reason for the failure
        reason: String,
    },

    /// An answer was rejected
    #[error("Invalid value for '{name}': {reason}")]
    InvalidAnswer {
        /// Question name
        name: String,
        /// Casting, choice or validator message
        reason: String,
    },

    /// The template declares a `_min_version` newer than this binary
    #[error("Template requires stamp {required}, but this is {current}")]
    UnsupportedVersion {
        /// Required minimum version
        required: String,
        /// Running version
        current: String,
    },

    /// A post-render task failed
    #[error("Task failed: {command}")]
    TaskFailed {
        /// Rendered command line
        command: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// Git operation failed during execution
    ///
    /// # Fields
    /// - `operation`: The git operation that failed (e.g., "describe", "status")
    /// - `stderr`: The error output from the git command
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git operation that failed
        operation: String,
        /// The error output from the git command
        stderr: String,
    },

    /// Git executable not found in PATH
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// Git repository clone failed
    #[error("Failed to clone template repository: {url}")]
    GitCloneFailed {
        /// The repository URL that failed to clone
        url: String,
        /// The reason for the clone failure
        reason: String,
    },

    /// Git checkout failed
    #[error("Failed to checkout reference '{reference}' in template repository")]
    GitCheckoutFailed {
        /// The git reference (branch, tag, or commit) that failed to checkout
        reference: String,
        /// The reason for the checkout failure
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// The CLI displays errors as three colored lines: the error (red), the
/// details (yellow) and the suggestion (green).
///
/// ```rust,no_run
/// use stamp_cli::core::{ErrorContext, StampError};
///
/// let context = ErrorContext::new(StampError::DestinationNotEmpty {
///     path: "./my-app".to_string(),
/// })
/// .with_suggestion("Choose a new destination")
/// .with_details("stamp never overwrites existing projects");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: StampError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: StampError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`StampError`] anywhere in the chain, then I/O errors, and
/// falls back to a generic context carrying the full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(stamp_error) = error.chain().find_map(|e| e.downcast_ref::<StampError>()) {
        return create_error_context(stamp_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(StampError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check ownership and permissions of the template and destination");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(StampError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(StampError::Other {
        message,
    })
}

fn create_error_context(error: StampError) -> ErrorContext {
    match &error {
        StampError::TemplateNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Pass a directory containing stamp.yml, a git URL, or a gh:owner/repo shorthand")
            .with_details("Every template needs a stamp.yml (or stamp.yaml) declaring its variables"),

        StampError::DestinationNotEmpty { .. } => ErrorContext::new(error)
            .with_suggestion("Choose a destination that does not exist yet or is an empty directory"),

        StampError::MissingVariable { name } => {
            let suggestion = format!("Pass it with '-d {name}=VALUE' or accept template defaults with --defaults");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        StampError::PolicyError { .. } => ErrorContext::new(error)
            .with_suggestion("Review the template's _tasks, then re-run with --trust or add the source to 'trust' in your config")
            .with_details("Templates that run commands after rendering must be explicitly trusted"),

        StampError::RenderError { message, .. } => {
            let details = message.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Variables use {{ name }}, control flow uses {% %}; check the token names against stamp.yml")
        }

        StampError::SchemaError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the YAML syntax of stamp.yml; question names must be identifiers like project_name"),

        StampError::InvalidAnswer { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'stamp inspect <template>' to see accepted types and choices"),

        StampError::UnsupportedVersion { required, .. } => {
            let suggestion = format!("Upgrade stamp to {required} or newer");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        StampError::TaskFailed { stderr, code, .. } => {
            let details = match code {
                Some(code) => format!("exit code {code}: {}", stderr.trim()),
                None => format!("terminated by signal or timeout: {}", stderr.trim()),
            };
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Fix the failing command or run it manually inside the generated project")
        }

        StampError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git from https://git-scm.com/ or your package manager")
            .with_details("stamp uses the system git to fetch versioned templates"),

        StampError::GitCloneFailed { url, reason } => {
            let suggestion = format!("Verify the repository URL is correct: {url}");
            let details = reason.trim().to_string();
            ErrorContext::new(error).with_suggestion(suggestion).with_details(details)
        }

        StampError::GitCheckoutFailed { reason, .. } => {
            let details = reason.trim().to_string();
            ErrorContext::new(error)
                .with_suggestion("Verify the tag, branch or commit passed with --vcs-ref exists ('git tag -l')")
                .with_details(details)
        }

        StampError::GitCommandError { stderr, .. } => {
            let details = stderr.trim().to_string();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Try running the git command manually for more details")
        }

        StampError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Check ~/.stamp/config.toml or the file passed with --config"),

        StampError::Other { .. } => ErrorContext::new(error),
    }
}
