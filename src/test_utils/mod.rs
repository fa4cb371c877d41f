//! Test utilities for stamp
//!
//! Shared by unit tests and the integration suite (through the
//! `test-utils` feature):
//! - [`init_test_logging`] - one-time tracing setup writing to the test harness
//! - [`fixtures`] - the Python project template and other on-disk templates
//! - [`TestGit`] - synchronous git helper for preparing template repositories
//!
//! # Example
//!
//! ```rust,no_run
//! use stamp_cli::test_utils::{PythonTemplateFixture, init_test_logging};
//!
//! # fn example() -> anyhow::Result<()> {
//! init_test_logging(None);
//! let dir = tempfile::TempDir::new()?;
//! let template = PythonTemplateFixture::create(dir.path())?;
//! assert!(template.root().join("stamp.yml").is_file());
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod git_helper;

pub use fixtures::{PYTHON_TEMPLATE_SCHEMA, PythonTemplateFixture, expected_python_files};
pub use git_helper::TestGit;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise logging is enabled only when `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
