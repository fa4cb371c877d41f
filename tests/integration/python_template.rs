//! The Python project template: output shape, substitution and determinism.

use anyhow::Result;
use stamp_cli::naming::package_name;
use stamp_cli::test_utils::expected_python_files;

use crate::common::{TestEnv, assert_files_exist, missing_files, read, read_tree};

/// (variables, expected project name, expected package, expected description)
const SCENARIOS: &[(&[(&str, &str)], &str, &str, &str)] = &[
    (&[], "test-project", "test_project", "A cool new Python project"),
    (&[("project_name", "my-cool-app")], "my-cool-app", "my_cool_app", "A cool new Python project"),
    (
        &[("project_name", "amazing-tool"), ("project_description", "An amazing development tool")],
        "amazing-tool",
        "amazing_tool",
        "An amazing development tool",
    ),
];

#[tokio::test]
async fn test_python_template_scenarios() -> Result<()> {
    let env = TestEnv::python()?;

    for (index, (data, project, package, description)) in SCENARIOS.iter().enumerate() {
        let outcome = env.render(&format!("scenario-{index}"), data).await?;
        let destination = &outcome.destination;

        assert_eq!(package_name(project), *package);
        assert_files_exist(destination, &expected_python_files(package));
        assert!(destination.join(package).join("__init__.py").is_file());

        let pyproject = read(destination, "pyproject.toml");
        assert!(pyproject.contains(&format!("name = \"{project}\"")));
        assert!(pyproject.contains(&format!("description = \"{description}\"")));
        assert!(pyproject.contains(&format!("{project} = \"{package}.main:main\"")));
        assert!(!pyproject.contains("{{ project_name }}"));
        assert!(!pyproject.contains("{{ project_description }}"));

        let readme = read(destination, "README.md");
        assert!(readme.starts_with(&format!("# {project}\n")));
        assert!(readme.contains(&format!("python -m {package}.main")));
        assert!(!readme.contains("{{"));

        let main_py = read(destination, &format!("{package}/main.py"));
        assert!(main_py.contains(&format!("Hello from {project}!")));
    }
    Ok(())
}

#[tokio::test]
async fn test_verbatim_files_are_unchanged() -> Result<()> {
    let env = TestEnv::python()?;
    let outcome = env.render("out", &[]).await?;

    for file in [".gitignore", ".config/mise.toml"] {
        assert_eq!(
            read(&outcome.destination, file),
            std::fs::read_to_string(env.template.root().join(file))?
        );
    }
    assert!(!outcome.destination.join("stamp.yml").exists());
    Ok(())
}

#[tokio::test]
async fn test_answers_file_records_resolved_map() -> Result<()> {
    let env = TestEnv::python()?;
    let outcome = env.render("out", &[("project_name", "my-cool-app")]).await?;

    let answers: serde_yaml::Mapping =
        serde_yaml::from_str(&read(&outcome.destination, ".template-answers.yaml"))?;
    assert_eq!(answers.get("project_name").and_then(|v| v.as_str()), Some("my-cool-app"));
    assert_eq!(answers.get("package_name").and_then(|v| v.as_str()), Some("my_cool_app"));
    assert_eq!(
        answers.get("project_description").and_then(|v| v.as_str()),
        Some("A cool new Python project")
    );
    assert!(answers.get("_src_path").is_some());
    assert!(answers.get("_commit").is_none());

    let last = outcome.files.last().map(|path| path.to_string_lossy().into_owned());
    assert_eq!(last.as_deref(), Some(".template-answers.yaml"));
    Ok(())
}

#[tokio::test]
async fn test_identical_inputs_render_identical_trees() -> Result<()> {
    let env = TestEnv::python()?;
    let data = [("project_name", "my-cool-app"), ("project_description", "Same twice")];

    let first = env.render("first", &data).await?;
    let second = env.render("second", &data).await?;

    let first_tree = read_tree(&first.destination)?;
    assert_eq!(first_tree, read_tree(&second.destination)?);
    assert_eq!(first_tree.len(), expected_python_files("my_cool_app").len() + 1);
    assert_eq!(first.files, second.files);
    Ok(())
}

#[tokio::test]
async fn test_missing_required_file_is_detected() -> Result<()> {
    let env = TestEnv::python()?;
    let outcome = env.render("out", &[]).await?;
    let expected = expected_python_files("test_project");
    assert!(missing_files(&outcome.destination, &expected).is_empty());

    std::fs::remove_file(outcome.destination.join("README.md"))?;
    assert_eq!(missing_files(&outcome.destination, &expected), ["README.md"]);

    let result = std::panic::catch_unwind(|| assert_files_exist(&outcome.destination, &expected));
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_existing_empty_destination_is_accepted() -> Result<()> {
    let env = TestEnv::python()?;
    let destination = env.destination("empty");
    std::fs::create_dir(&destination)?;

    env.render("empty", &[]).await?;
    assert_files_exist(&destination, &expected_python_files("test_project"));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_rendered_files_keep_template_modes() -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::python()?;
    for relative in ["pyproject.toml", ".gitignore", "{{ package_name }}/main.py"] {
        let path = env.template_dir.path().join(relative);
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    }
    env.render("modes", &[]).await?;

    let destination = env.destination("modes");
    let mode = |relative: &str| -> Result<u32> {
        Ok(fs::metadata(destination.join(relative))?.permissions().mode() & 0o777)
    };
    for relative in ["pyproject.toml", ".gitignore", "test_project/main.py"] {
        assert_eq!(mode(relative)?, 0o644, "{relative}");
    }

    let reference = env.output_dir.path().join("reference.txt");
    fs::write(&reference, "x")?;
    let default_mode = fs::metadata(&reference)?.permissions().mode() & 0o777;
    assert_eq!(mode(".template-answers.yaml")?, default_mode);
    Ok(())
}
