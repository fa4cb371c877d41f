//! Git templates: revision selection, recorded commits and dirty snapshots.

use anyhow::Result;
use stamp_cli::core::StampError;
use stamp_cli::generator::run_copy;
use stamp_cli::test_utils::{PythonTemplateFixture, TestGit, init_test_logging};
use tempfile::TempDir;

use crate::common::{read, stamp_error};

struct GitEnv {
    template_dir: TempDir,
    output_dir: TempDir,
    template: PythonTemplateFixture,
    git: TestGit,
}

impl GitEnv {
    /// Template tagged `v1.0.0`, then a second tagged `v1.1.0` with a new
    /// description default, then an untagged commit adding `CHANGELOG.md`.
    fn tagged() -> Result<Self> {
        init_test_logging(None);
        let template_dir = TempDir::new()?;
        let (template, git) = PythonTemplateFixture::create_git(template_dir.path())?;
        git.tag("v1.0.0")?;

        let schema = std::fs::read_to_string(template.root().join("stamp.yml"))?;
        template.set_schema(&schema.replace("A cool new Python project", "Version one-one"))?;
        git.commit_all("Describe v1.1")?;
        git.tag("v1.1.0")?;

        template.write_file("CHANGELOG.md", "unreleased\n")?;
        git.commit_all("Unreleased changelog")?;

        Ok(Self {
            template_dir,
            output_dir: TempDir::new()?,
            template,
            git,
        })
    }

    fn request(&self, name: &str) -> stamp_cli::generator::RenderRequest {
        stamp_cli::generator::RenderRequest::new(
            self.template_dir.path().display().to_string(),
            self.output_dir.path().join(name),
        )
        .use_defaults(true)
    }
}

#[tokio::test]
async fn test_latest_tag_is_default_revision() -> Result<()> {
    let env = GitEnv::tagged()?;
    let outcome = run_copy(env.request("out")).await?;

    assert_eq!(outcome.commit.as_deref(), Some("v1.1.0"));
    assert!(!outcome.destination.join("CHANGELOG.md").exists());
    assert!(read(&outcome.destination, "pyproject.toml").contains("Version one-one"));

    let answers = read(&outcome.destination, ".template-answers.yaml");
    assert!(answers.contains("_commit: v1.1.0"));
    Ok(())
}

#[tokio::test]
async fn test_explicit_tag() -> Result<()> {
    let env = GitEnv::tagged()?;
    let outcome = run_copy(env.request("out").vcs_ref(Some("v1.0.0".to_string()))).await?;

    assert_eq!(outcome.commit.as_deref(), Some("v1.0.0"));
    assert!(read(&outcome.destination, "pyproject.toml").contains("A cool new Python project"));
    Ok(())
}

#[tokio::test]
async fn test_head_selects_latest_commit() -> Result<()> {
    let env = GitEnv::tagged()?;
    let outcome = run_copy(env.request("out").vcs_ref(Some("HEAD".to_string()))).await?;

    assert!(outcome.destination.join("CHANGELOG.md").is_file());
    let commit = outcome.commit.unwrap_or_default();
    assert!(commit.starts_with("v1.1.0-1-g"), "unexpected describe output: {commit}");
    Ok(())
}

#[tokio::test]
async fn test_unknown_revision() -> Result<()> {
    let env = GitEnv::tagged()?;
    let error = run_copy(env.request("out").vcs_ref(Some("v9.0.0".to_string())))
        .await
        .unwrap_err();

    assert!(matches!(
        stamp_error(&error),
        Some(StampError::GitCheckoutFailed { reference, .. }) if reference == "v9.0.0"
    ));
    assert!(!env.output_dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn test_untagged_repository_uses_head() -> Result<()> {
    init_test_logging(None);
    let template_dir = TempDir::new()?;
    let (_template, git) = PythonTemplateFixture::create_git(template_dir.path())?;
    let output_dir = TempDir::new()?;

    let outcome = run_copy(
        stamp_cli::generator::RenderRequest::new(
            template_dir.path().display().to_string(),
            output_dir.path().join("out"),
        )
        .use_defaults(true),
    )
    .await?;

    let head = git.rev_parse_head()?;
    let commit = outcome.commit.unwrap_or_default();
    assert!(head.starts_with(&commit), "{commit} is not an abbreviation of {head}");
    Ok(())
}

#[tokio::test]
async fn test_dirty_template_renders_draft_changes() -> Result<()> {
    let env = GitEnv::tagged()?;
    env.template.write_file("DRAFT.md", "# {{ project_name }} draft\n")?;
    let head = env.git.rev_parse_head()?;

    let outcome = run_copy(env.request("out")).await?;

    assert_eq!(read(&outcome.destination, "DRAFT.md"), "# test-project draft\n");
    assert!(outcome.destination.join("CHANGELOG.md").is_file());
    assert_eq!(env.git.rev_parse_head()?, head);
    assert!(env.git.status_porcelain()?.contains("DRAFT.md"));
    Ok(())
}

#[tokio::test]
async fn test_git_directory_is_never_copied() -> Result<()> {
    let env = GitEnv::tagged()?;
    let outcome = run_copy(env.request("out")).await?;
    assert!(!outcome.destination.join(".git").exists());
    Ok(())
}
