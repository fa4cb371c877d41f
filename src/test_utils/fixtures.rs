//! On-disk template fixtures
//!
//! [`PythonTemplateFixture`] writes a small Python project template: a
//! `pyproject.toml` and `README.md` with placeholder tokens, a few verbatim
//! files and a package directory named after the derived `package_name`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::TestGit;

/// Schema of the Python project template.
pub const PYTHON_TEMPLATE_SCHEMA: &str = r#"_answers_file: .template-answers.yaml

project_name:
  type: str
  help: Name of the project (kebab case)
  default: test-project

project_description:
  type: str
  help: One-line description
  default: A cool new Python project

package_name:
  type: str
  help: Importable package name
  default: "{{ project_name | package_name }}"
  when: false
"#;

const PYPROJECT_TOML: &str = r#"[project]
name = "{{ project_name }}"
version = "0.1.0"
description = "{{ project_description }}"
readme = "README.md"
requires-python = ">=3.12"

[project.scripts]
{{ project_name }} = "{{ package_name }}.main:main"

[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"
"#;

const README_MD: &str = r#"# {{ project-name }}

{{ project_description }}

## Usage

```sh
python -m {{ package_name }}.main
```
"#;

const GITIGNORE: &str = "__pycache__/\n*.py[co]\n.venv/\ndist/\n";

const MISE_TOML: &str = "[tools]\npython = \"3.12\"\nuv = \"latest\"\n";

const MAIN_PY: &str = r#"def main() -> None:
    print("Hello from {{ project_name }}!")


if __name__ == "__main__":
    main()
"#;

/// Relative paths every rendering of the Python template must produce.
pub fn expected_python_files(package_name: &str) -> Vec<String> {
    vec![
        "pyproject.toml".to_string(),
        "README.md".to_string(),
        ".gitignore".to_string(),
        ".config/mise.toml".to_string(),
        ".template-answers.yaml".to_string(),
        format!("{package_name}/main.py"),
    ]
}

/// A Python project template written to a directory.
#[derive(Debug, Clone)]
pub struct PythonTemplateFixture {
    root: PathBuf,
}

impl PythonTemplateFixture {
    /// Write the template into `root`, creating it if needed.
    pub fn create(root: &Path) -> Result<Self> {
        let fixture = Self {
            root: root.to_path_buf(),
        };
        fixture.write_file("stamp.yml", PYTHON_TEMPLATE_SCHEMA)?;
        fixture.write_file("pyproject.toml", PYPROJECT_TOML)?;
        fixture.write_file("README.md", README_MD)?;
        fixture.write_file(".gitignore", GITIGNORE)?;
        fixture.write_file(".config/mise.toml", MISE_TOML)?;
        fixture.write_file("{{ package_name }}/__init__.py", "")?;
        fixture.write_file("{{ package_name }}/main.py", MAIN_PY)?;
        Ok(fixture)
    }

    /// Write the template and commit it to a fresh git repository.
    pub fn create_git(root: &Path) -> Result<(Self, TestGit)> {
        let fixture = Self::create(root)?;
        let git = TestGit::new(root);
        git.init()?;
        git.commit_all("Initial template")?;
        Ok((fixture, git))
    }

    /// Template root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write (or overwrite) a template file.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Replace the schema file.
    pub fn set_schema(&self, content: &str) -> Result<()> {
        self.write_file("stamp.yml", content)?;
        Ok(())
    }

    /// Append lines to the schema file.
    pub fn append_schema(&self, extra: &str) -> Result<()> {
        let path = self.root.join("stamp.yml");
        let mut content = fs::read_to_string(&path)?;
        content.push('\n');
        content.push_str(extra);
        fs::write(&path, content)?;
        Ok(())
    }

    /// Remove a template file.
    pub fn remove_file(&self, relative: &str) -> Result<()> {
        fs::remove_file(self.root.join(relative))
            .with_context(|| format!("Failed to remove {relative}"))
    }
}
