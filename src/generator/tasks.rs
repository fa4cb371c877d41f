//! Post-render tasks (`_tasks`).
//!
//! Tasks are shell commands a template runs inside the freshly rendered
//! project, such as `git init` or `uv sync`. They execute arbitrary code
//! and are therefore only run when the caller allowed unsafe operations or
//! trusts the template source; [`super::run_copy`] enforces that before
//! anything is written.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context as _, Result};
use tera::Context;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::{TASK_STAGE_ENV, TASK_TIMEOUT};
use crate::core::StampError;
use crate::schema::{TaskSpec, yaml_to_plain_string};
use crate::templating::{TemplateRenderer, is_truthy};
use crate::utils::get_shell_command;

/// Run `tasks` in order inside `destination`.
///
/// Returns the rendered commands that ran.
///
/// # Errors
///
/// - [`StampError::RenderError`] when a command or `when` clause cannot be rendered
/// - [`StampError::TaskFailed`] for a non-zero exit or a timeout
pub async fn run_tasks(
    tasks: &[TaskSpec],
    renderer: &TemplateRenderer,
    context: &Context,
    destination: &Path,
) -> Result<Vec<String>> {
    let mut executed = Vec::new();

    for (index, task) in tasks.iter().enumerate() {
        let label = format!("_tasks[{index}]");
        let render_error = |e: crate::templating::TemplateError| StampError::RenderError {
            path: label.clone(),
            message: e.format_with_context(),
        };

        let enabled = match task.when() {
            None => true,
            Some(serde_yaml::Value::Bool(enabled)) => *enabled,
            Some(serde_yaml::Value::String(expression)) => {
                renderer.render_condition(expression, context, None).map_err(render_error)?
            }
            Some(other) => is_truthy(&yaml_to_plain_string(other)),
        };
        if !enabled {
            tracing::debug!("Skipping {}: condition is false", label);
            continue;
        }

        let command = renderer.render_str(task.command(), context, None).map_err(render_error)?;
        run_task(&command, destination).await?;
        executed.push(command);
    }

    Ok(executed)
}

async fn run_task(command: &str, destination: &Path) -> Result<()> {
    let (shell, flag) = get_shell_command();
    tracing::info!("Running task: {}", command);

    let mut cmd = Command::new(shell);
    cmd.arg(flag)
        .arg(command)
        .current_dir(destination)
        .env(TASK_STAGE_ENV, "task")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(TASK_TIMEOUT, cmd.output()).await {
        Ok(result) => result.with_context(|| format!("Failed to start task: {command}"))?,
        Err(_) => {
            return Err(StampError::TaskFailed {
                command: command.to_string(),
                code: None,
                stderr: format!("timed out after {} seconds", TASK_TIMEOUT.as_secs()),
            }
            .into());
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        tracing::info!(target: "task", "{}", line);
    }

    if !output.status.success() {
        return Err(StampError::TaskFailed {
            command: command.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }
    Ok(())
}
