//! Constants used throughout gpass.
//!
//! Centralizes magic strings and configuration values.

/// Application directory name under the user's config directory.
pub const APP_DIR: &str = "gpass";

/// Session configuration file name.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "GPASS_CONFIG_DIR";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "GPASS_LOG";

/// Global git configuration file, relative to the home directory.
pub const GITCONFIG: &str = ".gitconfig";

/// Name of the encrypted file stored on every secret branch.
pub const SECRET_FILE: &str = "secret.gpg";

/// Armor type of an encrypted message.
pub const PGP_MESSAGE: &str = "PGP MESSAGE";

/// Armor type of a private key block.
pub const PGP_PRIVATE_KEY: &str = "PGP PRIVATE KEY BLOCK";

/// Passphrase prompts offered per key by the terminal prompt.
pub const MAX_PASSPHRASE_ATTEMPTS: usize = 3;

/// Branch reference namespace.
pub const BRANCH_PREFIX: &str = "refs/heads/";

/// Tag reference namespace.
pub const TAG_PREFIX: &str = "refs/tags/";

/// Message of the root commit of a new secret branch.
pub fn orphan_commit_message(name: &str) -> String {
    format!("creating branch for: {}", name)
}
