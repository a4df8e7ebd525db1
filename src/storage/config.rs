//! Configuration handling for typed-prefs
//!
//! Configuration is stored in `~/.config/typed-prefs/config.toml` (or the
//! platform equivalent) and selects which store the `prefs` tool opens.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FileStore, PreferenceStore, SqliteStore};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Which store implementation to open
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// JSON document with file locking
    #[default]
    Json,
    /// SQLite database
    Sqlite,
}

impl Backend {
    pub fn as_str(&self) -> &str {
        match self {
            Backend::Json => "json",
            Backend::Sqlite => "sqlite",
        }
    }

    /// Default file name inside the data directory
    fn file_name(&self) -> &'static str {
        match self {
            Backend::Json => "prefs.json",
            Backend::Sqlite => "prefs.db",
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Store backend
    pub backend: Backend,

    /// Store location (defaults to the platform data directory)
    pub path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_dir() {
            Some(dir) => Self::from_file(&dir.join("config.toml")),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file; a missing file yields defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match &self.path {
            Some(path) if path.as_os_str().is_empty() => {
                Err(ConfigError::Invalid("path must not be empty".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Returns the config directory
    pub fn config_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the store path, falling back to the platform data directory
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        let dirs = project_dirs()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join(self.backend.file_name()))
    }

    /// Opens the configured store
    pub fn open_store(&self) -> Result<Arc<dyn PreferenceStore>> {
        let path = self.store_path()?;
        log::debug!("Opening {} store at {}", self.backend.as_str(), path.display());

        let store: Arc<dyn PreferenceStore> = match self.backend {
            Backend::Json => Arc::new(
                FileStore::open(&path)
                    .with_context(|| format!("Failed to open store: {}", path.display()))?,
            ),
            Backend::Sqlite => Arc::new(
                SqliteStore::open(&path)
                    .with_context(|| format!("Failed to open store: {}", path.display()))?,
            ),
        };

        Ok(store)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "typed-prefs", "typed-prefs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Editor;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Json);
        assert!(config.path.is_none());
    }

    #[test]
    fn parse_config() {
        let toml = r#"
backend = "sqlite"
path = "/tmp/prefs.db"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.path, Some(PathBuf::from("/tmp/prefs.db")));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_backend_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend = \"redis\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }

    #[test]
    fn empty_path_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "path = \"\"\n").unwrap();

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let config = Config {
            backend: Backend::Json,
            path: Some(PathBuf::from("custom.json")),
        };
        assert_eq!(config.store_path().unwrap(), PathBuf::from("custom.json"));
    }

    #[test]
    fn open_store_for_each_backend() {
        let dir = TempDir::new().unwrap();

        for (backend, name) in [(Backend::Json, "prefs.json"), (Backend::Sqlite, "prefs.db")] {
            let config = Config {
                backend,
                path: Some(dir.path().join(name)),
            };

            let store = config.open_store().unwrap();
            Editor::new(&*store).put_int("n", 5).commit().unwrap();

            let reopened = config.open_store().unwrap();
            assert_eq!(reopened.get_int("n", -1).unwrap(), 5, "{}", backend.as_str());
        }
    }
}
