//! Configuration file I/O operations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.chorus/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chorus")
    }

    /// Get the global config file path (~/.chorus/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Workspace-local config file path (<dir>/.chorus/config.toml)
    pub fn workspace_config_path(dir: &Path) -> PathBuf {
        dir.join(".chorus").join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve and load the effective configuration.
    ///
    /// Lookup order: the explicit path, `<work_dir>/.chorus/config.toml`,
    /// `~/.chorus/config.toml`, built-in defaults. The workspace root is
    /// always set to `work_dir`.
    pub fn load(work_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = explicit {
            Self::from_file(path)?
        } else {
            let workspace = Self::workspace_config_path(work_dir);
            let global = Self::global_config_path();
            if workspace.exists() {
                debug!("Loading workspace config {}", workspace.display());
                Self::from_file(&workspace)?
            } else if global.exists() {
                debug!("Loading global config {}", global.display());
                Self::from_file(&global)?
            } else {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        let root = work_dir
            .canonicalize()
            .unwrap_or_else(|_| work_dir.to_path_buf());
        Ok(config.with_workspace_root(root))
    }
}
