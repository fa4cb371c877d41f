//! stamp - project scaffolding from templates
//!
//! stamp renders a template (a directory or git repository holding
//! placeholder files and a `stamp.yml` schema) into a new project
//! directory, substituting the answers to the template's questions and
//! recording them in an answers file.
//!
//! # Architecture Overview
//!
//! A render ([`generator::run_copy`]) flows through:
//! - [`source`] - Resolve a local path, git URL or `gh:`/`gl:` shorthand and
//!   check out the requested revision
//! - [`schema`] - Parse the questions and `_`-prefixed settings of `stamp.yml`
//! - [`answers`] - Resolve, cast and validate the answers; write the answers file
//! - [`templating`] - Tera rendering with hyphenated-token normalisation,
//!   undefined-variable policies and structured errors
//! - [`generator`] - Walk the template tree, write files and run `_tasks`
//!
//! # Supporting Modules
//! - [`cli`] - `stamp copy` and `stamp inspect`
//! - [`config`] - User configuration (`~/.stamp/config.toml`)
//! - [`core`] - Error taxonomy and user-facing error context
//! - [`git`] - Async wrapper around the system `git` binary
//! - [`naming`] - Name derivations such as `package_name`
//! - [`utils`] - File system and platform helpers
//!
//! # Template Format
//!
//! ```yaml
//! # stamp.yml
//! _answers_file: .template-answers.yaml
//!
//! project_name:
//!   type: str
//!   default: test-project
//! package_name:
//!   default: "{{ project_name | package_name }}"
//!   when: false
//! ```
//!
//! Files and file names use Tera syntax: `{{ project_name }}/README.md`.
//! A bare hyphenated token such as `{{ project-name }}` resolves to
//! `project_name`.
//!
//! # Example
//!
//! ```rust,no_run
//! use stamp_cli::generator::{RenderRequest, run_copy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let outcome = run_copy(
//!     RenderRequest::new("./templates/python", "./my-cool-app")
//!         .data("project_name", "my-cool-app")
//!         .use_defaults(true),
//! )
//! .await?;
//! assert!(outcome.destination.join("my_cool_app/main.py").exists());
//! # Ok(())
//! # }
//! ```

pub mod answers;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod generator;
pub mod git;
pub mod naming;
pub mod schema;
pub mod source;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
