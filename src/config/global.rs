//! User configuration (`~/.stamp/config.toml`).
//!
//! The file is optional. It holds answers the user wants applied to every
//! template and the template locations trusted to run tasks:
//!
//! ```toml
//! # Templates under these prefixes may run `_tasks` without --trust
//! trust = ["https://github.com/my-org/", "~/templates/"]
//!
//! [defaults]
//! author = "Jane Doe"
//! licence = "MIT"
//! ```
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.stamp/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\stamp\config.toml`
//!
//! A different file can be passed with `--config`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::StampError;
use crate::utils::platform::{get_home_dir, resolve_path};

/// Global configuration structure for stamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Trusted template locations.
    ///
    /// An entry ending in `/` trusts every source under that prefix; any
    /// other entry trusts exactly that source. `~` is expanded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trust: Vec<String>,

    /// Answers applied to any template declaring a question of that name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, toml::Value>,
}

impl GlobalConfig {
    /// Load from `path`, or from [`default_path`](Self::default_path) when
    /// `None`. A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StampError::ConfigError`] when the file exists but is not
    /// valid.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match Self::default_path() {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("No default config location: {}", e);
                    return Ok(Self::default());
                }
            },
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config file at {}", path.display());
            Ok(Self::default())
        }
    }

    /// Load global configuration from a specific file path.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| StampError::ConfigError {
            message: format!("{}: {}", path.display(), e.message()),
        })?;
        tracing::debug!(
            "Loaded config {} ({} trust entries, {} defaults)",
            path.display(),
            config.trust.len(),
            config.defaults.len()
        );
        Ok(config)
    }

    /// Save global configuration to a specific file path.
    ///
    /// Creates parent directories as needed; on Unix the file is made
    /// readable by its owner only.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read permissions for {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).await.with_context(|| {
                format!("Failed to set permissions on {}", path.display())
            })?;
        }

        Ok(())
    }

    /// Get the default file path for global configuration.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("stamp")
        } else {
            get_home_dir()?.join(".stamp")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Whether any of `locations` (URL or path spellings of one template)
    /// is trusted.
    pub fn is_trusted<S: AsRef<str>>(&self, locations: &[S]) -> bool {
        self.trust.iter().any(|entry| {
            let entry = match resolve_path(entry) {
                Ok(path) => path.to_string_lossy().into_owned(),
                Err(_) => entry.clone(),
            };
            locations.iter().any(|location| {
                let location = location.as_ref();
                if entry.ends_with('/') {
                    location.starts_with(&entry) || format!("{location}/") == entry
                } else {
                    location == entry
                }
            })
        })
    }

    /// User defaults as JSON values, ready to be cast to question types.
    pub fn default_answers(&self) -> BTreeMap<String, serde_json::Value> {
        self.defaults
            .iter()
            .filter_map(|(name, value)| match serde_json::to_value(value) {
                Ok(json) => Some((name.clone(), json)),
                Err(e) => {
                    tracing::warn!("Ignoring config default '{}': {}", name, e);
                    None
                }
            })
            .collect()
    }
}
