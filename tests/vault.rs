//! End-to-end secret lifecycle through the vault.

mod support;

use gpass::core::cipher::{Keyring, NoPassphrase, ScriptedPassphrases};
use gpass::core::config::Config;
use gpass::core::repo::Repository;
use gpass::core::vault::Vault;
use gpass::error::{Error, StoreError, VaultError};
use support::*;
use tempfile::TempDir;

fn open_vault(dir: &TempDir) -> Vault {
    let repo = Repository::open(dir.path()).unwrap();
    let keyring = Keyring::from_armored(test_key().as_bytes(), &mut NoPassphrase).unwrap();
    Vault::new(repo, keyring, identity())
}

#[test]
fn test_add_then_reveal() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    let mut vault = open_vault(&dir);

    vault.add("db", b"postgres://user:pw@host/db").unwrap();

    assert_eq!(tree_files(&raw, "db"), vec!["secret.gpg"]);
    let on_disk = std::fs::read_to_string(dir.path().join("secret.gpg")).unwrap();
    assert!(on_disk.starts_with("-----BEGIN PGP MESSAGE-----"));
    assert!(!on_disk.contains("postgres"));

    let revealed = vault.reveal("db", &mut NoPassphrase).unwrap();
    assert_eq!(revealed.as_bytes(), b"postgres://user:pw@host/db");
}

#[test]
fn test_secrets_live_on_separate_branches() {
    let dir = TempDir::new().unwrap();
    let raw = init_repo(dir.path());
    let mut vault = open_vault(&dir);

    vault.add("alpha", b"one").unwrap();
    vault.add("beta", b"two").unwrap();

    let repo = vault.repository();
    let alpha = repo.commit_info(&repo.branch_tip("alpha").unwrap()).unwrap();
    let alpha_root = repo.commit_info(&alpha.parents[0]).unwrap();
    assert!(alpha_root.is_root());
    assert_eq!(tree_files(&raw, "beta"), vec!["secret.gpg"]);

    assert_eq!(vault.reveal("alpha", &mut NoPassphrase).unwrap().as_bytes(), b"one");
    assert_eq!(vault.reveal("beta", &mut NoPassphrase).unwrap().as_bytes(), b"two");
}

#[test]
fn test_add_twice_is_refused() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    let mut vault = open_vault(&dir);

    let first = vault.add("db", b"one").unwrap();
    let err = vault.add("db", b"two").unwrap_err();

    assert!(matches!(err, Error::Vault(VaultError::SecretExists(_))));
    assert_eq!(vault.repository().branch_tip("db").unwrap(), first);
}

#[test]
fn test_failed_add_leaves_no_branch_behind() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    let mut vault = open_vault(&dir);
    let stale = dir.path().join("secret.gpg");
    std::fs::write(&stale, "left over\n").unwrap();

    let err = vault.add("db", b"one").unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::FileExists(_))));
    assert!(!vault.repository().branch_exists("db"));
    assert_eq!(vault.repository().current_branch().as_deref(), Some("main"));
    assert_eq!(std::fs::read_to_string(&stale).unwrap(), "left over\n");

    std::fs::remove_file(&stale).unwrap();
    vault.add("db", b"one").unwrap();
    assert_eq!(vault.reveal("db", &mut NoPassphrase).unwrap().as_bytes(), b"one");
}

#[test]
fn test_restored_version_reveals_tagged_value() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    let mut vault = open_vault(&dir);

    vault.add("db", b"v1 value").unwrap();
    let repo = vault.repository_mut();
    repo.add_tag_branch("db-v1", "db").unwrap();
    let create = !repo.branch_exists("db-v1");
    repo.tag_branch("db-v1", create).unwrap();

    let revealed = vault.reveal("db-v1", &mut NoPassphrase).unwrap();
    assert_eq!(revealed.as_bytes(), b"v1 value");
}

#[test]
fn test_open_from_config() {
    let t = Test::new();
    let config = Config::new(identity(), t.repo.path(), &t.key);

    let mut vault = Vault::open(&config, &mut NoPassphrase).unwrap();
    vault.add("api", b"token").unwrap();
    assert_eq!(vault.reveal("api", &mut NoPassphrase).unwrap().as_bytes(), b"token");
}

#[test]
fn test_open_with_protected_key() {
    let t = Test::with_key(&protected_key());
    let config = Config::new(identity(), t.repo.path(), &t.key);

    let mut source = ScriptedPassphrases::new([PASSPHRASE]);
    let mut vault = Vault::open(&config, &mut source).unwrap();
    vault.add("api", b"token").unwrap();
    assert_eq!(vault.reveal("api", &mut NoPassphrase).unwrap().as_bytes(), b"token");
}

#[test]
fn test_open_with_missing_key_file() {
    let t = Test::new();
    let config = Config::new(identity(), t.repo.path(), t.home.path().join("missing.asc"));

    let err = Vault::open(&config, &mut NoPassphrase).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::ReadFailed { .. })));
}
