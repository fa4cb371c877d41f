//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use stamp_cli::core::StampError;
use stamp_cli::generator::{RenderOutcome, RenderRequest, run_copy};
use stamp_cli::test_utils::{PythonTemplateFixture, init_test_logging};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A template directory and a scratch area for destinations.
pub struct TestEnv {
    pub template_dir: TempDir,
    pub output_dir: TempDir,
    pub template: PythonTemplateFixture,
}

impl TestEnv {
    /// Python template as a plain directory.
    pub fn python() -> Result<Self> {
        init_test_logging(None);
        let template_dir = TempDir::new()?;
        let template = PythonTemplateFixture::create(template_dir.path())?;
        Ok(Self {
            template_dir,
            output_dir: TempDir::new()?,
            template,
        })
    }

    pub fn template_path(&self) -> String {
        self.template_dir.path().display().to_string()
    }

    /// A destination path that does not exist yet.
    pub fn destination(&self, name: &str) -> PathBuf {
        self.output_dir.path().join(name)
    }

    /// Request rendering the template into `destination(name)`.
    pub fn request(&self, name: &str) -> RenderRequest {
        RenderRequest::new(self.template_path(), self.destination(name))
    }

    /// Render with `data` and defaults accepted.
    pub async fn render(&self, name: &str, data: &[(&str, &str)]) -> Result<RenderOutcome> {
        run_copy(self.request(name).data_map(data.iter().copied()).use_defaults(true)).await
    }
}

/// The [`StampError`] inside `error`, if any.
pub fn stamp_error(error: &anyhow::Error) -> Option<&StampError> {
    error.downcast_ref::<StampError>()
}

/// Expected files missing from `destination`.
pub fn missing_files(destination: &Path, expected: &[String]) -> Vec<String> {
    expected.iter().filter(|path| !destination.join(path).is_file()).cloned().collect()
}

/// Assert every expected file exists.
pub fn assert_files_exist(destination: &Path, expected: &[String]) {
    let missing = missing_files(destination, expected);
    assert!(missing.is_empty(), "missing files in {}: {:?}", destination.display(), missing);
}

/// Every file under `root`, keyed by relative path.
pub fn read_tree(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(root)?.to_string_lossy().replace('\\', "/");
            files.insert(relative, fs::read(entry.path())?);
        }
    }
    Ok(files)
}

pub fn read(destination: &Path, relative: &str) -> String {
    fs::read_to_string(destination.join(relative))
        .unwrap_or_else(|e| panic!("failed to read {relative}: {e}"))
}
