//! Tera-based rendering of file contents and path names.
//!
//! Every file of a template goes through [`TemplateRenderer::render_str`]
//! with a context built from the resolved answers. Two conveniences sit on
//! top of plain Tera:
//!
//! - bare hyphenated tokens (`{{ project-name }}`) resolve to the underscore
//!   variable (`project_name`) when it exists;
//! - the [`UndefinedPolicy`] decides whether unknown tokens fail the render
//!   or survive verbatim.
//!
//! Failures are reported as [`TemplateError`] with the offending line and
//! close variable names.

pub mod error;
pub mod filters;
pub mod renderer;

pub use error::{ErrorLocation, TemplateError};
pub use renderer::{TemplateRenderer, UndefinedPolicy, contains_template_syntax, is_truthy};
