//! Init command.
//!
//! Resolves the committing identity, checks that the repository opens and
//! the private key unlocks, then records all three in the config file.

use std::path::Path;

use tracing::info;

use crate::cli::output;
use crate::core::cipher::{Keyring, TerminalPrompt};
use crate::core::config::Config;
use crate::core::identity::Identity;
use crate::core::repo::Repository;
use crate::error::{Result, StoreError};

/// Initialize the session configuration.
pub fn execute(repository: &Path, key: &Path) -> Result<()> {
    let identity = Identity::resolve()?;
    info!(user = %identity, "initializing");

    let repository = std::fs::canonicalize(repository)?;
    Repository::open(&repository)?;

    let key = std::fs::canonicalize(key).map_err(|e| StoreError::ReadFailed {
        path: key.to_path_buf(),
        source: e,
    })?;
    let armored = zeroize::Zeroizing::new(std::fs::read(&key).map_err(|e| StoreError::ReadFailed {
        path: key.clone(),
        source: e,
    })?);
    let keyring = Keyring::from_armored(&armored, &mut TerminalPrompt::default())?;

    if Config::exists() {
        output::warn("replacing existing configuration");
    }
    let config = Config::new(identity, repository, key);
    let path = config.save()?;

    output::success(&format!("initialized {}", output::path(&path)));
    output::kv("user:      ", &config.user);
    output::kv("repository:", config.repository.display());
    output::kv("keys:      ", format!("{:?}", keyring));
    Ok(())
}
