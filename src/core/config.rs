//! Session configuration.
//!
//! Records who commits, which repository holds the secrets and where the
//! private key lives. Stored as pretty JSON in
//! `<config_dir>/gpass/config.json`; `GPASS_CONFIG_DIR` overrides the
//! directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::identity::Identity;
use crate::error::{ConfigError, Result};

/// Configuration written by `gpass init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Commit author.
    pub user: Identity,
    /// Worktree root of the secret repository.
    pub repository: PathBuf,
    /// Armored private key file.
    pub private_key: PathBuf,
}

impl Config {
    pub fn new(user: Identity, repository: impl Into<PathBuf>, private_key: impl Into<PathBuf>) -> Self {
        Self {
            user,
            repository: repository.into(),
            private_key: private_key.into(),
        }
    }

    /// Directory holding the configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if no directory can be determined.
    pub fn dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(constants::CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|dir| dir.join(constants::APP_DIR))
            .ok_or_else(|| ConfigError::NoConfigDir.into())
    }

    /// Path of the configuration file.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join(constants::CONFIG_FILE))
    }

    /// Whether a configuration file exists.
    pub fn exists() -> bool {
        Self::path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Load the configuration from its default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotInitialized` if the file doesn't exist,
    /// `ConfigError::ReadFile` if it cannot be read, or `ConfigError::Parse`
    /// if the JSON is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Err(ConfigError::NotInitialized.into());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;

        debug!(repository = %config.repository.display(), "config loaded");
        Ok(config)
    }

    /// Save the configuration to its default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` or `ConfigError::WriteFile`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving config");

        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteFile)?;
        }
        std::fs::write(path, contents + "\n").map_err(ConfigError::WriteFile)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    fn sample() -> Config {
        Config::new(
            Identity::new("Ada", "ada@example.com", "/home/ada"),
            "/srv/secrets",
            "/home/ada/.gnupg/private.asc",
        )
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(constants::CONFIG_FILE);

        sample().save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_missing_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_from(&dir.path().join(constants::CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotInitialized)));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(constants::CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_is_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(constants::CONFIG_FILE);
        sample().save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n  \"repository\": \"/srv/secrets\""));
        assert!(contents.contains("\"email\": \"ada@example.com\""));
    }
}
