//! `_tasks`: permission and execution.

use anyhow::Result;
use stamp_cli::config::GlobalConfig;
use stamp_cli::core::StampError;
use stamp_cli::generator::run_copy;

use crate::common::{TestEnv, read, stamp_error};

const TASKS: &str = r#"_tasks:
  - "echo {{ package_name }} > task-output.txt"
  - command: "echo skipped > skipped.txt"
    when: "{{ project_name == 'never' }}"
"#;

#[cfg(unix)]
#[tokio::test]
async fn test_tasks_run_when_allowed() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema(TASKS)?;

    let outcome = run_copy(env.request("out").use_defaults(true).allow_unsafe(true)).await?;

    assert_eq!(read(&outcome.destination, "task-output.txt").trim(), "test_project");
    assert!(!outcome.destination.join("skipped.txt").exists());
    assert_eq!(outcome.tasks_run, ["echo test_project > task-output.txt"]);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_trusted_prefix_allows_tasks() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema(TASKS)?;
    let parent = env.template_dir.path().canonicalize()?.parent().map(|p| p.to_path_buf());
    let config = GlobalConfig {
        trust: vec![format!("{}/", parent.unwrap_or_default().display())],
        ..GlobalConfig::default()
    };

    let outcome = run_copy(env.request("out").use_defaults(true).config(config)).await?;
    assert!(outcome.destination.join("task-output.txt").is_file());
    Ok(())
}

#[tokio::test]
async fn test_untrusted_config_still_refuses() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema(TASKS)?;
    let config = GlobalConfig {
        trust: vec!["https://github.com/someone-else/".to_string()],
        ..GlobalConfig::default()
    };

    let error = run_copy(env.request("out").use_defaults(true).config(config)).await.unwrap_err();
    assert!(matches!(stamp_error(&error), Some(StampError::PolicyError { .. })));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_task_is_reported_and_cleaned_up() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("_tasks:\n  - \"exit 7\"\n")?;

    let error = run_copy(env.request("out").use_defaults(true).allow_unsafe(true))
        .await
        .unwrap_err();
    assert!(matches!(
        stamp_error(&error),
        Some(StampError::TaskFailed { code: Some(7), .. })
    ));
    assert!(!env.destination("out").exists());
    Ok(())
}
