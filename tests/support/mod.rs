//! Test support utilities for gpass integration tests.
//!
//! Provides isolated environments (home, config dir, secret repository)
//! and helpers for keys and repositories.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod keys;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use keys::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// `home` holds a `.gitconfig` and the private key, `repo` is a git
/// repository with one commit on `main`, `config` receives the gpass
/// configuration. Child processes get everything through environment
/// variables, so tests can run in parallel.
pub struct Test {
    pub home: TempDir,
    pub repo: TempDir,
    pub config: TempDir,
    pub key: PathBuf,
}

impl Test {
    /// Environment with an unprotected private key.
    pub fn new() -> Self {
        Self::with_key(&test_key())
    }

    /// Environment with the given armored private key.
    pub fn with_key(armored: &str) -> Self {
        let home = TempDir::new().expect("failed to create temp home");
        let repo = TempDir::new().expect("failed to create temp repo");
        let config = TempDir::new().expect("failed to create temp config dir");

        write_gitconfig(home.path());
        init_repo(repo.path());

        let key = home.path().join("private.asc");
        std::fs::write(&key, armored).expect("failed to write key");

        Self {
            home,
            repo,
            config,
            key,
        }
    }

    /// Environment with `gpass init` already run.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t.init_cmd();
        assert_success(&output);
        t
    }
}
