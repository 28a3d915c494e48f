//! Commit author identity.
//!
//! The identity is resolved once from the user's global git configuration
//! and then treated as an immutable value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::constants;
use crate::error::{IdentityError, Result};

/// The committing user.
///
/// Used only as commit author metadata; never stored alongside secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    email: String,
    home: PathBuf,
}

impl Identity {
    /// Create an identity from known values.
    pub fn new(name: impl Into<String>, email: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            home: home.into(),
        }
    }

    /// Resolve the identity of the current user from `~/.gitconfig`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NoHomeDir` if the home directory is unknown,
    /// or any error from [`Identity::from_git_config`].
    pub fn resolve() -> Result<Self> {
        let home = dirs::home_dir().ok_or(IdentityError::NoHomeDir)?;
        Self::from_git_config(&home)
    }

    /// Read `user.name` and `user.email` from `<home>/.gitconfig`.
    ///
    /// A missing name falls back to the login name; a missing email is an
    /// error because git cannot author commits without one.
    pub fn from_git_config(home: &Path) -> Result<Self> {
        let path = home.join(constants::GITCONFIG);
        debug!(path = %path.display(), "reading git identity");

        if !path.exists() {
            return Err(IdentityError::GitConfig(format!("{} does not exist", path.display())).into());
        }

        let config = git2::Config::open(&path)
            .map_err(|e| IdentityError::GitConfig(e.message().to_string()))?;

        let email = config
            .get_string("user.email")
            .map_err(|_| IdentityError::MissingEmail(path.clone()))?;

        let name = match config.get_string("user.name") {
            Ok(name) => name,
            Err(_) => {
                let fallback = whoami::username();
                warn!(fallback = %fallback, "no user.name in git config, using login name");
                fallback
            }
        };

        Ok(Self::new(name, email, home))
    }

    /// Author name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Author email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Home directory the identity was resolved from.
    pub fn home(&self) -> &Path {
        &self.home
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
