//! Command-line interface for stamp.
//!
//! # Commands
//!
//! - `copy` - Render a template into a new project directory
//! - `inspect` - Show the questions and settings a template declares
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Only warnings and errors are logged
//! - `--config <PATH>` - Use an alternate user configuration file
//!
//! Logs go to stderr through `tracing`; `RUST_LOG` takes precedence over
//! the verbosity flags. Command output goes to stdout.
//!
//! ```bash
//! stamp copy gh:acme/python-template my-cool-app -d project_name=my-cool-app --defaults
//! stamp inspect ./templates/python --format json
//! ```

mod copy;
mod inspect;


use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use copy::CopyCommand;
pub use inspect::{InspectCommand, OutputFormat};

/// Project scaffolding from templates.
#[derive(Parser, Debug)]
#[command(
    name = "stamp",
    about = "Render project templates into new projects",
    version,
    long_about = "stamp renders a template directory or git repository into a new project, \
                  substituting answers to the questions declared in the template's stamp.yml."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the user configuration file (default: ~/.stamp/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template into a new project directory
    Copy(CopyCommand),
    /// Show the questions and settings of a template
    Inspect(InspectCommand),
}

impl Cli {
    /// Run the parsed command.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_level());

        match self.command {
            Commands::Copy(cmd) => cmd.execute(self.config, self.quiet).await,
            Commands::Inspect(cmd) => cmd.execute().await,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `default_level`.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Fails only when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
