//! Error types.
//!
//! Errors are grouped by concern and wrapped by [`Error`]. Every variant
//! carries the operation context and the underlying cause so the CLI can
//! present it to the user as-is.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Keyring(#[from] KeyringError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors while building a keyring from a private key block.
#[derive(Error, Debug)]
pub enum KeyringError {
    #[error("not an armor encoded PGP private key: {0}")]
    NotArmored(String),

    #[error("not an OpenPGP private key: armor type is {0:?}")]
    NotPrivateKey(String),

    #[error("unable to read armor decoded key: {0}")]
    KeyParse(String),

    #[error("failed to decrypt main private key {key_id}: {reason}")]
    KeyDecryptFailed { key_id: String, reason: String },
}

/// Errors from message encryption and decryption.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("the message is encrypted already")]
    AlreadyEncrypted,

    #[error("the message is not encrypted")]
    NotEncrypted,

    #[error("invalid PGP message or not armor encoded: {0}")]
    InvalidArmor(String),

    #[error("not a PGP message: armor type is {0:?}")]
    WrongMessageType(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("unable to decrypt the message: {0}")]
    DecryptionFailed(String),
}

/// Errors from persisting and reading secret files.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("the message content has not been loaded")]
    EmptyMessage,

    #[error("not allowed to write unencrypted content to a file")]
    RefusePlaintextWrite,

    #[error("file already exists: {0}")]
    FileExists(PathBuf),

    #[error("unable to restrict permissions on {path}: {source}")]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from repository state transitions.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("no git repository found at {0}")]
    RepositoryNotFound(PathBuf),

    #[error("unable to open repository at {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("origin branch not found: {0}")]
    OriginNotFound(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error("{op}: worktree error: {message}")]
    Worktree { op: &'static str, message: String },

    #[error("unable to git add {path}: {message}")]
    Add { path: String, message: String },

    #[error("unable to commit: {0}")]
    Commit(String),

    #[error("unable to write ref {refname}: {message}")]
    RefWrite { refname: String, message: String },

    #[error("unable to delete ref {refname}: {message}")]
    RefDelete { refname: String, message: String },

    #[error("unable to read commit {id}: {message}")]
    ReadCommit { id: String, message: String },
}

/// Errors from the secret lifecycle.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("invalid secret name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("secret value cannot be empty")]
    EmptySecret,

    #[error("secret already exists: {0}")]
    SecretExists(String),

    #[error("secret not found: {0}")]
    SecretNotFound(String),
}

/// Errors from session configuration persistence.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not initialized: run `gpass init` first")]
    NotInitialized,

    #[error("unable to determine the configuration directory")]
    NoConfigDir,

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to write config file: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors while resolving the committing user.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("unable to determine home directory")]
    NoHomeDir,

    #[error("git config could not be read: {0}")]
    GitConfig(String),

    #[error("no user.email set in {0}")]
    MissingEmail(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
