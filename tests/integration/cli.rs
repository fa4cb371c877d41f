//! The `stamp` binary.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::{TestEnv, read};

fn stamp(env: &TestEnv) -> Command {
    let mut cmd = Command::cargo_bin("stamp").unwrap();
    // Never pick up the developer's configuration
    cmd.arg("--config").arg(env.output_dir.path().join("config.toml"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_copy_with_defaults() -> Result<()> {
    let env = TestEnv::python()?;
    let destination = env.destination("my-cool-app");

    stamp(&env)
        .arg("copy")
        .arg(env.template_path())
        .arg(&destination)
        .args(["-d", "project_name=my-cool-app", "--defaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"))
        .stdout(predicate::str::contains("pyproject.toml"))
        .stdout(predicate::str::contains("my_cool_app"));

    assert!(read(&destination, "pyproject.toml").contains("name = \"my-cool-app\""));
    Ok(())
}

#[test]
fn test_copy_with_data_file() -> Result<()> {
    let env = TestEnv::python()?;
    let data_file = env.output_dir.path().join("answers.yml");
    std::fs::write(
        &data_file,
        "project_name: from-file\nproject_description: Described in a file\n",
    )?;
    let destination = env.destination("out");

    stamp(&env)
        .arg("copy")
        .arg(env.template_path())
        .arg(&destination)
        .arg("--data-file")
        .arg(&data_file)
        .args(["-d", "project_name=from-flag"])
        .assert()
        .success();

    let pyproject = read(&destination, "pyproject.toml");
    assert!(pyproject.contains("name = \"from-flag\""));
    assert!(pyproject.contains("Described in a file"));
    Ok(())
}

#[test]
fn test_missing_variable_exits_with_error() -> Result<()> {
    let env = TestEnv::python()?;

    stamp(&env)
        .arg("copy")
        .arg(env.template_path())
        .arg(env.destination("out"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("project_name"))
        .stderr(predicate::str::contains("--defaults"));

    assert!(!env.destination("out").exists());
    Ok(())
}

#[test]
fn test_config_defaults_apply() -> Result<()> {
    let env = TestEnv::python()?;
    std::fs::write(
        env.output_dir.path().join("config.toml"),
        "[defaults]\nproject_description = \"From config\"\n",
    )?;
    let destination = env.destination("out");

    stamp(&env)
        .arg("copy")
        .arg(env.template_path())
        .arg(&destination)
        .args(["-d", "project_name=cfg", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created").not());

    assert!(read(&destination, "pyproject.toml").contains("From config"));
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
    let env = TestEnv::python()?;
    std::fs::write(env.output_dir.path().join("config.toml"), "trust = 3\n")?;

    stamp(&env)
        .arg("copy")
        .arg(env.template_path())
        .arg(env.destination("out"))
        .arg("--defaults")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.toml"));
    Ok(())
}

#[test]
fn test_tasks_need_trust_flag() -> Result<()> {
    let env = TestEnv::python()?;
    env.template.append_schema("_tasks:\n  - \"echo hi\"\n")?;

    stamp(&env)
        .arg("copy")
        .arg(env.template_path())
        .arg(env.destination("out"))
        .arg("--defaults")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--trust"));
    Ok(())
}

#[test]
fn test_inspect_json() -> Result<()> {
    let env = TestEnv::python()?;

    let output = stamp(&env)
        .arg("inspect")
        .arg(env.template_path())
        .args(["--format", "json"])
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = report["questions"]
        .as_array()
        .map(|questions| questions.iter().filter_map(|q| q["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, ["project_name", "project_description", "package_name"]);
    Ok(())
}

#[test]
fn test_inspect_text() -> Result<()> {
    let env = TestEnv::python()?;

    stamp(&env)
        .arg("inspect")
        .arg(env.template_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("project_description"))
        .stdout(predicate::str::contains("[derived]"));
    Ok(())
}
