//! Vault.
//!
//! Ties the keyring, the repository and the committing identity together
//! for the two operations that touch key material: storing a new secret
//! and revealing an existing one.

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::core::cipher::{Keyring, Message, PassphraseSource};
use crate::core::config::Config;
use crate::core::constants;
use crate::core::identity::Identity;
use crate::core::repo::{Backend, CommitId, GitBackend, Repository};
use crate::core::store;
use crate::core::validation::validate_name;
use crate::error::{Result, StoreError, VaultError};

/// An unlocked secret repository.
pub struct Vault<B: Backend = GitBackend> {
    repo: Repository<B>,
    keyring: Keyring,
    identity: Identity,
}

impl<B: Backend + std::fmt::Debug> std::fmt::Debug for Vault<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("repo", &self.repo)
            .field("keyring", &self.keyring)
            .field("identity", &self.identity)
            .finish()
    }
}

impl Vault<GitBackend> {
    /// Open the configured repository and unlock the configured key.
    ///
    /// # Errors
    ///
    /// Returns repository errors from [`Repository::open`],
    /// `StoreError::ReadFailed` if the key file cannot be read, and keyring
    /// errors from [`Keyring::from_armored`].
    pub fn open(config: &Config, passphrases: &mut dyn PassphraseSource) -> Result<Self> {
        let repo = Repository::open(&config.repository)?;

        let key = std::fs::read(&config.private_key)
            .map(Zeroizing::new)
            .map_err(|e| StoreError::ReadFailed {
                path: config.private_key.clone(),
                source: e,
            })?;
        let keyring = Keyring::from_armored(&key, passphrases)?;

        Ok(Self::new(repo, keyring, config.user.clone()))
    }
}

impl<B: Backend> Vault<B> {
    pub fn new(repo: Repository<B>, keyring: Keyring, identity: Identity) -> Self {
        Self {
            repo,
            keyring,
            identity,
        }
    }

    pub fn repository(&self) -> &Repository<B> {
        &self.repo
    }

    pub fn repository_mut(&mut self) -> &mut Repository<B> {
        &mut self.repo
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// Store a new secret on its own orphan branch.
    ///
    /// The plaintext is encrypted before the repository is touched, so a
    /// failing keyring leaves no branch behind. If writing or committing the
    /// secret fails, the previous branch is checked out again and the new
    /// branch is deleted.
    ///
    /// # Errors
    ///
    /// - `VaultError::InvalidName` if `name` cannot be a branch name
    /// - `VaultError::EmptySecret` if `plaintext` is empty
    /// - `VaultError::SecretExists` if a secret with that name exists
    /// - cipher, store and repository errors from the underlying steps
    pub fn add(&mut self, name: &str, plaintext: &[u8]) -> Result<CommitId> {
        validate_name(name)?;
        if plaintext.is_empty() {
            return Err(VaultError::EmptySecret.into());
        }
        if self.repo.branch_exists(name) {
            return Err(VaultError::SecretExists(name.to_string()).into());
        }

        let sealed = self.keyring.encrypt(&Message::plaintext(plaintext))?;

        let previous = self.repo.current_branch();
        self.repo.create_orphan_branch(&self.identity, name)?;

        match self.commit_sealed(name, &sealed) {
            Ok(id) => {
                info!(secret = name, commit = %id.short(), "secret added");
                Ok(id)
            }
            Err(e) => {
                self.abandon_branch(name, previous.as_deref());
                Err(e)
            }
        }
    }

    /// Write the ciphertext into the worktree and commit it.
    fn commit_sealed(&mut self, name: &str, sealed: &Message) -> Result<CommitId> {
        let path = self.repo.worktree_path(constants::SECRET_FILE)?;
        store::write_secret(&path, sealed)?;

        let committed = self.repo.commit_file(
            &self.identity,
            constants::SECRET_FILE,
            &format!("adding secret: {}", name),
        );
        if committed.is_err() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "unable to remove uncommitted secret file");
            }
        }
        committed
    }

    /// Return to `previous` and delete the half-created branch `name`.
    fn abandon_branch(&mut self, name: &str, previous: Option<&str>) {
        let Some(previous) = previous else {
            warn!(secret = name, "no previous branch to return to; leaving secret branch in place");
            return;
        };

        let rolled_back = self
            .repo
            .checkout_branch(previous)
            .and_then(|()| self.repo.remove_branch(name));
        match rolled_back {
            Ok(()) => debug!(secret = name, branch = previous, "secret branch rolled back"),
            Err(e) => warn!(secret = name, error = %e, "unable to roll back secret branch"),
        }
    }

    /// Check out a secret's branch and decrypt it.
    ///
    /// # Errors
    ///
    /// - `VaultError::SecretNotFound` if there is no such secret
    /// - repository, store and cipher errors from the underlying steps
    pub fn reveal(&mut self, name: &str, passphrases: &mut dyn PassphraseSource) -> Result<Message> {
        if !self.repo.branch_exists(name) {
            return Err(VaultError::SecretNotFound(name.to_string()).into());
        }

        self.repo.checkout_branch(name)?;
        let path = self.repo.worktree_path(constants::SECRET_FILE)?;
        let sealed = store::read_secret(&path)?;

        debug!(secret = name, "decrypting secret");
        self.keyring.decrypt(&sealed, passphrases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::NoPassphrase;
    use crate::core::repo::MemoryBackend;
    use crate::error::{CipherError, Error};

    fn identity() -> Identity {
        Identity::new("Ada", "ada@example.com", "/home/ada")
    }

    fn vault() -> Vault<MemoryBackend> {
        let mut repo = Repository::with_backend(MemoryBackend::new());
        repo.commit(&identity(), "initial").unwrap();
        Vault::new(repo, Keyring::new(), identity())
    }

    #[test]
    fn test_add_rejects_invalid_name() {
        let mut vault = vault();
        let err = vault.add("a/b", b"x").unwrap_err();
        assert!(matches!(err, Error::Vault(VaultError::InvalidName { .. })));
    }

    #[test]
    fn test_add_rejects_empty_secret() {
        let mut vault = vault();
        let err = vault.add("db", b"").unwrap_err();
        assert!(matches!(err, Error::Vault(VaultError::EmptySecret)));
    }

    #[test]
    fn test_add_rejects_existing_secret() {
        let mut vault = vault();
        let err = vault.add("main", b"x").unwrap_err();
        assert!(matches!(err, Error::Vault(VaultError::SecretExists(name)) if name == "main"));
    }

    #[test]
    fn test_add_encrypts_before_touching_repository() {
        let mut vault = vault();
        let err = vault.add("db", b"x").unwrap_err();
        assert!(matches!(err, Error::Cipher(CipherError::EncryptionFailed(_))));
        assert!(!vault.repository().branch_exists("db"));
    }

    #[test]
    fn test_reveal_missing_secret() {
        let mut vault = vault();
        let err = vault.reveal("ghost", &mut NoPassphrase).unwrap_err();
        assert!(matches!(err, Error::Vault(VaultError::SecretNotFound(_))));
    }
}
