//! `stamp copy`: render a template into a new project.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::GlobalConfig;
use crate::core::StampError;
use crate::generator::{RenderRequest, run_copy};
use crate::schema::yaml_to_plain_string;

/// Render a template into a new project directory.
#[derive(Args, Debug)]
pub struct CopyCommand {
    /// Template: local directory, git URL, or gh:owner/repo / gl:owner/repo
    pub template: String,

    /// Destination directory; must not exist or be empty
    pub destination: PathBuf,

    /// Answer a question, e.g. `-d project_name=my-app` (repeatable)
    #[arg(short = 'd', long = "data", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub data: Vec<(String, String)>,

    /// YAML file of answers; `--data` values take precedence
    #[arg(long, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Accept template defaults for unanswered questions
    #[arg(long)]
    pub defaults: bool,

    /// Allow the template to run its `_tasks`
    #[arg(long)]
    pub trust: bool,

    /// Template revision (tag, branch, commit or HEAD)
    #[arg(long, value_name = "REF")]
    pub vcs_ref: Option<String>,

    /// Keep a partially rendered destination when copying fails
    #[arg(long)]
    pub no_cleanup: bool,
}

impl CopyCommand {
    /// Load configuration and answers, render, and report what was written.
    pub async fn execute(self, config_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let config = GlobalConfig::load_with_optional(config_path).await?;

        let mut data = match &self.data_file {
            Some(path) => load_data_file(path).await?,
            None => BTreeMap::new(),
        };
        data.extend(self.data);

        let outcome = run_copy(
            RenderRequest::new(self.template, self.destination)
                .data_map(data)
                .use_defaults(self.defaults)
                .allow_unsafe(self.trust)
                .vcs_ref(self.vcs_ref)
                .config(config)
                .cleanup_on_error(!self.no_cleanup),
        )
        .await?;

        if !quiet {
            println!(
                "{} {}",
                "Created".green().bold(),
                outcome.destination.display()
            );
            for file in &outcome.files {
                println!("  {}", file.display());
            }
            if let Some(commit) = &outcome.commit {
                println!("{} {}", "Template revision".dimmed(), commit);
            }
        }
        if let Some(message) = &outcome.message_after_copy {
            println!("\n{}", message.trim_end());
        }
        Ok(())
    }
}

/// Parse a `KEY=VALUE` argument; the value may contain `=`.
pub(crate) fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Read a YAML mapping of answers.
async fn load_data_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    let mapping: serde_yaml::Mapping =
        serde_yaml::from_str(&content).map_err(|e| StampError::ConfigError {
            message: format!("{}: {e}", path.display()),
        })?;

    Ok(mapping
        .iter()
        .map(|(key, value)| (yaml_to_plain_string(key), yaml_to_plain_string(value)))
        .collect())
}
