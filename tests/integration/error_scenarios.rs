//! Failure kinds of a render and what they leave behind.

use anyhow::Result;
use stamp_cli::core::StampError;
use stamp_cli::generator::run_copy;

use crate::common::{TestEnv, stamp_error};

#[tokio::test]
async fn test_missing_template_directory() -> Result<()> {
    let env = TestEnv::python()?;
    let missing = env.template_dir.path().join("nope");
    let error = run_copy(stamp_cli::generator::RenderRequest::new(
        missing.display().to_string(),
        env.destination("out"),
    ))
    .await
    .unwrap_err();

    assert!(matches!(stamp_error(&error), Some(StampError::TemplateNotFound { .. })));
    assert!(!env.destination("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_template_without_schema() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.remove_file("stamp.yml")?;

    let error = env.render("out", &[]).await.unwrap_err();
    assert!(matches!(stamp_error(&error), Some(StampError::TemplateNotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn test_destination_not_empty() -> Result<()> {
    let env = TestEnv::python()?;
    let destination = env.destination("busy");
    std::fs::create_dir(&destination)?;
    std::fs::write(destination.join("keep.txt"), "mine")?;

    let error = env.render("busy", &[]).await.unwrap_err();
    assert!(matches!(stamp_error(&error), Some(StampError::DestinationNotEmpty { .. })));
    assert_eq!(std::fs::read_to_string(destination.join("keep.txt"))?, "mine");
    assert!(!destination.join("pyproject.toml").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_variable_without_defaults() -> Result<()> {
    let env = TestEnv::python()?;
    let error = run_copy(env.request("out").data("project_name", "x")).await.unwrap_err();

    assert_eq!(
        stamp_error(&error),
        Some(&StampError::MissingVariable {
            name: "project_description".to_string()
        })
    );
    assert!(!env.destination("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_tasks_without_permission_are_refused_before_writing() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("_tasks:\n  - touch created-by-task\n")?;

    let error = env.render("out", &[]).await.unwrap_err();
    assert!(matches!(stamp_error(&error), Some(StampError::PolicyError { .. })));
    assert!(!env.destination("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_undefined_token_removes_new_destination() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.write_file("zz-last.txt", "{{ not_declared }}\n")?;

    let error = env.render("out", &[]).await.unwrap_err();
    match stamp_error(&error) {
        Some(StampError::RenderError {
            path,
            message,
        }) => {
            assert_eq!(path, "zz-last.txt");
            assert!(message.contains("not_declared"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!env.destination("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_no_cleanup_keeps_partial_output() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.write_file("zz-last.txt", "{{ not_declared }}\n")?;

    let request = env.request("out").use_defaults(true).cleanup_on_error(false);
    assert!(run_copy(request).await.is_err());
    assert!(env.destination("out").join("pyproject.toml").exists());
    Ok(())
}

#[tokio::test]
async fn test_failure_keeps_preexisting_destination() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.write_file("zz-last.txt", "{{ not_declared }}\n")?;
    std::fs::create_dir(env.destination("out"))?;

    assert!(env.render("out", &[]).await.is_err());
    assert!(env.destination("out").is_dir());
    Ok(())
}

#[tokio::test]
async fn test_malformed_token() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.write_file("broken.txt", "line one\n{{ project_name \n")?;

    let error = env.render("out", &[]).await.unwrap_err();
    assert!(matches!(
        stamp_error(&error),
        Some(StampError::RenderError { path, .. }) if path == "broken.txt"
    ));
    Ok(())
}

#[tokio::test]
async fn test_hyphenated_question_name_is_schema_error() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.set_schema("project-name: demo\n")?;

    let error = env.render("out", &[]).await.unwrap_err();
    assert!(matches!(stamp_error(&error), Some(StampError::SchemaError { .. })));
    Ok(())
}

#[tokio::test]
async fn test_invalid_answer() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("workers:\n  type: int\n  default: 2\n")?;

    let error = env.render("out", &[("workers", "lots")]).await.unwrap_err();
    assert!(matches!(
        stamp_error(&error),
        Some(StampError::InvalidAnswer { name, .. }) if name == "workers"
    ));
    Ok(())
}

#[tokio::test]
async fn test_unsupported_version() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("_min_version: \"99.0.0\"\n")?;

    let error = env.render("out", &[]).await.unwrap_err();
    assert!(matches!(
        stamp_error(&error),
        Some(StampError::UnsupportedVersion { required, .. }) if required == "99.0.0"
    ));
    Ok(())
}
