//! Template features beyond the Python template: conditional paths,
//! suffixes, settings and the undefined-token policy.

use anyhow::Result;
use serial_test::serial;
use stamp_cli::config::GlobalConfig;
use stamp_cli::generator::{RenderRequest, run_copy};
use stamp_cli::test_utils::PYTHON_TEMPLATE_SCHEMA;

use crate::common::{TestEnv, read};

#[tokio::test]
async fn test_conditional_directory() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("use_docs: false\n")?;
    env.template.write_file("{% if use_docs %}docs{% endif %}/index.md", "# {{ project_name }}\n")?;

    let without = env.render("without", &[]).await?;
    assert!(!without.destination.join("docs").exists());

    let with = env.render("with", &[("use_docs", "yes")]).await?;
    assert_eq!(read(&with.destination, "docs/index.md"), "# test-project\n");
    Ok(())
}

#[tokio::test]
async fn test_templates_suffix_limits_rendering() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("_templates_suffix: .jinja\n")?;
    env.template.write_file("NOTES.md.jinja", "{{ project_name }}\n")?;

    let outcome = env.render("out", &[]).await?;
    assert_eq!(read(&outcome.destination, "NOTES.md"), "test-project\n");
    assert!(read(&outcome.destination, "pyproject.toml").contains("{{ project_name }}"));
    // Names are rendered whatever the suffix
    assert!(outcome.destination.join("test_project/main.py").is_file());
    Ok(())
}

#[tokio::test]
async fn test_keep_policy_leaves_unknown_tokens() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("_undefined: keep\n")?;
    env.template.write_file(".github/workflow.yml", "run: ${{ matrix.python }} {{ project_name }}\n")?;

    let outcome = env.render("out", &[]).await?;
    assert_eq!(
        read(&outcome.destination, ".github/workflow.yml"),
        "run: ${{ matrix.python }} test-project\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_custom_answers_file_and_message() -> Result<()> {
    let env = TestEnv::python()?;
    let schema = PYTHON_TEMPLATE_SCHEMA.replace(
        "_answers_file: .template-answers.yaml",
        "_answers_file: \".stamp/{{ package_name }}.yml\"\n_message_after_copy: \"cd {{ project_name }} ({{ _stamp.answers_file }})\"",
    );
    env.template.set_schema(&schema)?;

    let outcome = env.render("out", &[]).await?;
    assert!(outcome.destination.join(".stamp/test_project.yml").is_file());
    assert!(!outcome.destination.join(".template-answers.yaml").exists());
    assert_eq!(
        outcome.message_after_copy.as_deref(),
        Some("cd test-project (.stamp/test_project.yml)")
    );
    Ok(())
}

#[tokio::test]
async fn test_subdirectory_and_exclude() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.set_schema("_subdirectory: template\n_exclude: [\"*.tmp\"]\nname: demo\n")?;
    env.template.write_file("template/{{ name }}.txt", "{{ name }}\n")?;
    env.template.write_file("template/scratch.tmp", "x")?;
    env.template.write_file("template/__pycache__/kept.txt", "no longer excluded")?;

    let outcome = env.render("out", &[]).await?;
    assert_eq!(read(&outcome.destination, "demo.txt"), "demo\n");
    assert!(!outcome.destination.join("scratch.tmp").exists());
    assert!(outcome.destination.join("__pycache__/kept.txt").exists());
    assert!(!outcome.destination.join("pyproject.toml").exists());
    Ok(())
}

#[tokio::test]
async fn test_user_defaults_and_passthrough_data() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.write_file("AUTHORS", "{{ author }}\n")?;
    let config: GlobalConfig = toml::from_str("[defaults]\nproject_name = \"configured\"\n")?;

    let outcome = run_copy(
        env.request("out")
            .config(config)
            .data("author", "Jane")
            .use_defaults(true),
    )
    .await?;

    assert!(read(&outcome.destination, "pyproject.toml").contains("name = \"configured\""));
    assert_eq!(read(&outcome.destination, "AUTHORS"), "Jane\n");
    let answers = read(&outcome.destination, ".template-answers.yaml");
    assert!(answers.contains("author: Jane"));
    Ok(())
}

#[tokio::test]
async fn test_secret_answers_are_not_recorded() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("api_token:\n  secret: true\n  default: \"\"\n")?;
    env.template.write_file(".env", "TOKEN={{ api_token }}\n")?;

    let outcome = env.render("out", &[("api_token", "s3cr3t")]).await?;
    assert_eq!(read(&outcome.destination, ".env"), "TOKEN=s3cr3t\n");
    assert!(!read(&outcome.destination, ".template-answers.yaml").contains("s3cr3t"));
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_relative_template_path() -> Result<()> {
    let env = TestEnv::python()?;
    let original = std::env::current_dir()?;
    std::env::set_current_dir(env.template_dir.path())?;

    let result = run_copy(RenderRequest::new(".", env.destination("out")).use_defaults(true)).await;
    std::env::set_current_dir(original)?;

    let outcome = result?;
    assert!(outcome.destination.join("README.md").is_file());
    let answers = read(&outcome.destination, ".template-answers.yaml");
    let expected = env.template_dir.path().canonicalize()?;
    assert!(answers.contains(&format!("_src_path: {}", expected.display())));
    Ok(())
}
