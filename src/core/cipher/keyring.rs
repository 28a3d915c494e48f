//! OpenPGP keyring session.
//!
//! Holds decrypted private-key entities and performs all encryption and
//! decryption for a session. Built from armored private key blocks using
//! rPGP; passphrase-protected keys are unlocked once at load time.

use pgp::composed::{Deserializable, Message as PgpMessage, MessageBuilder, SignedPublicKey, SignedSecretKey};
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::types::{KeyDetails, Password, PublicKeyTrait};
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use super::armor;
use super::message::Message;
use super::prompt::{KeyHint, PassphraseSource};
use crate::core::constants;
use crate::error::{CipherError, KeyringError, Result};

/// A private key entity and its public half.
struct Entity {
    secret: SignedSecretKey,
    public: SignedPublicKey,
    label: String,
}

impl Entity {
    /// Whether any secret material is still passphrase-protected.
    fn is_locked(&self) -> bool {
        self.secret.primary_key.secret_params().is_encrypted()
            || self
                .secret
                .secret_subkeys
                .iter()
                .any(|sub| sub.key.secret_params().is_encrypted())
    }

    fn hint(&self, attempt: usize) -> KeyHint {
        KeyHint {
            key_id: self.label.clone(),
            attempt,
        }
    }
}

/// Ordered set of private-key entities available to a session.
///
/// Every entity acts as a recipient for [`Keyring::encrypt`], and every
/// entity is tried in order by [`Keyring::decrypt`]. Key material is
/// dropped with the keyring.
#[derive(Default)]
pub struct Keyring {
    entities: Vec<Entity>,
}

impl Keyring {
    /// An empty keyring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a keyring from a single armored private key block.
    ///
    /// # Errors
    ///
    /// See [`Keyring::load`].
    pub fn from_armored(private_key: &[u8], passphrases: &mut dyn PassphraseSource) -> Result<Self> {
        let mut keyring = Self::new();
        keyring.load(private_key, passphrases)?;
        Ok(keyring)
    }

    /// Parse an armored private key block, unlock it and add it to the keyring.
    ///
    /// A protected primary key is retried with every passphrase the source
    /// offers until one fits. The accepted passphrase is then applied to the
    /// subkeys; a subkey that stays locked is logged and kept as is.
    ///
    /// # Errors
    ///
    /// - `KeyringError::NotArmored` if the input has no armor header
    /// - `KeyringError::NotPrivateKey` if the armor is not a private key block
    /// - `KeyringError::KeyParse` if the key cannot be read
    /// - `KeyringError::KeyDecryptFailed` if no passphrase unlocks the primary key
    pub fn load(&mut self, private_key: &[u8], passphrases: &mut dyn PassphraseSource) -> Result<()> {
        match armor::block_type(private_key) {
            None => {
                return Err(KeyringError::NotArmored("no armor header found".to_string()).into());
            }
            Some(kind) if kind != constants::PGP_PRIVATE_KEY => {
                return Err(KeyringError::NotPrivateKey(kind).into());
            }
            Some(_) => {}
        }

        let (mut secret, _headers) = SignedSecretKey::from_armor_single(private_key)
            .map_err(|e| KeyringError::KeyParse(e.to_string()))?;

        let label = format!("{:?}", secret.key_id());
        debug!(key = %label, subkeys = secret.secret_subkeys.len(), "loading private key");

        if secret.primary_key.secret_params().is_encrypted() {
            let passphrase = unlock_primary(&mut secret, &label, passphrases)?;
            unlock_subkeys(&mut secret, &label, &passphrase);
        }

        let public = SignedPublicKey::from(secret.clone());
        self.entities.push(Entity {
            secret,
            public,
            label,
        });

        debug!(entities = self.entities.len(), "keyring updated");
        Ok(())
    }

    /// Number of entities in the keyring.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no key has been loaded.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Encrypt a plaintext message to every entity in the keyring.
    ///
    /// # Errors
    ///
    /// - `CipherError::AlreadyEncrypted` if the message is ciphertext
    /// - `CipherError::EncryptionFailed` if the keyring is empty, an entity
    ///   has no encryption-capable key, or armoring fails
    pub fn encrypt(&self, message: &Message) -> Result<Message> {
        if message.is_encrypted() {
            return Err(CipherError::AlreadyEncrypted.into());
        }
        if self.entities.is_empty() {
            return Err(CipherError::EncryptionFailed("no keyring loaded".to_string()).into());
        }

        trace!(
            recipients = self.entities.len(),
            plaintext_len = message.len(),
            "encrypting message"
        );

        let mut rng = rand::thread_rng();
        let mut builder = MessageBuilder::from_bytes("", message.as_bytes().to_vec())
            .seipd_v1(&mut rng, SymmetricKeyAlgorithm::AES256);

        for entity in &self.entities {
            let subkey = entity
                .public
                .public_subkeys
                .iter()
                .find(|sub| sub.key.is_encryption_key());

            let added = match subkey {
                Some(sub) => builder.encrypt_to_key(&mut rng, &sub.key),
                None if entity.public.primary_key.is_encryption_key() => {
                    builder.encrypt_to_key(&mut rng, &entity.public.primary_key)
                }
                None => {
                    return Err(CipherError::EncryptionFailed(format!(
                        "key {} has no encryption capable key",
                        entity.label
                    ))
                    .into());
                }
            };
            added.map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        }

        let armored = builder
            .to_armored_string(&mut rng, Default::default())
            .map_err(|e| CipherError::EncryptionFailed(format!("unable to armor encode: {}", e)))?;

        trace!(ciphertext_len = armored.len(), "message encrypted");
        Ok(Message::armored(armored.into_bytes()))
    }

    /// Decrypt an armored message with the first entity that can open it.
    ///
    /// Entities are tried in load order. Locked entities ask `passphrases`
    /// once per attempt. A failing entity is not terminal; the error is
    /// returned only when every entity has failed. Neither the keyring nor
    /// the input message is modified.
    ///
    /// # Errors
    ///
    /// - `CipherError::NotEncrypted` if the message is plaintext
    /// - `CipherError::InvalidArmor` if the armor cannot be decoded
    /// - `CipherError::WrongMessageType` if the armor is not a `PGP MESSAGE`
    /// - `CipherError::DecryptionFailed` if no entity can decrypt it
    pub fn decrypt(&self, message: &Message, passphrases: &mut dyn PassphraseSource) -> Result<Message> {
        if !message.is_encrypted() {
            return Err(CipherError::NotEncrypted.into());
        }

        let armored = message.as_bytes();
        match armor::block_type(armored) {
            None => {
                return Err(CipherError::InvalidArmor("no armor header found".to_string()).into());
            }
            Some(kind) if kind != constants::PGP_MESSAGE => {
                return Err(CipherError::WrongMessageType(kind).into());
            }
            Some(_) => {}
        }
        PgpMessage::from_armor(armored).map_err(|e| CipherError::InvalidArmor(e.to_string()))?;

        if self.entities.is_empty() {
            return Err(CipherError::DecryptionFailed("no keyring loaded".to_string()).into());
        }

        trace!(ciphertext_len = armored.len(), "decrypting message");

        let mut failures = Vec::with_capacity(self.entities.len());
        for entity in &self.entities {
            match try_entity(entity, armored, passphrases) {
                Ok(plaintext) => {
                    trace!(key = %entity.label, plaintext_len = plaintext.len(), "message decrypted");
                    return Ok(Message::plaintext(plaintext.to_vec()));
                }
                Err(reason) => {
                    debug!(key = %entity.label, reason = %reason, "key could not decrypt message");
                    failures.push(format!("{}: {}", entity.label, reason));
                }
            }
        }

        Err(CipherError::DecryptionFailed(failures.join("; ")).into())
    }
}

impl std::fmt::Debug for Keyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entities.iter().map(|e| &e.label))
            .finish()
    }
}

/// Retry the primary key with passphrases until one removes its protection.
fn unlock_primary(
    secret: &mut SignedSecretKey,
    label: &str,
    passphrases: &mut dyn PassphraseSource,
) -> Result<Zeroizing<String>> {
    let mut attempt = 0;
    let mut reason = "no passphrase provided".to_string();

    while let Some(passphrase) = passphrases.passphrase(&KeyHint {
        key_id: label.to_string(),
        attempt,
    }) {
        match secret
            .primary_key
            .remove_password(&Password::from(passphrase.as_str()))
        {
            Ok(()) => {
                debug!(key = %label, attempt, "primary key unlocked");
                return Ok(passphrase);
            }
            Err(e) => {
                debug!(key = %label, attempt, "passphrase rejected");
                reason = e.to_string();
            }
        }
        attempt += 1;
    }

    Err(KeyringError::KeyDecryptFailed {
        key_id: label.to_string(),
        reason,
    }
    .into())
}

/// Best-effort: subkeys that reject the passphrase stay locked.
fn unlock_subkeys(secret: &mut SignedSecretKey, label: &str, passphrase: &str) {
    let password = Password::from(passphrase);
    for (index, sub) in secret.secret_subkeys.iter_mut().enumerate() {
        if !sub.key.secret_params().is_encrypted() {
            continue;
        }
        if let Err(e) = sub.key.remove_password(&password) {
            warn!(key = %label, subkey = index, error = %e, "subkey could not be unlocked");
        }
    }
}

/// Attempt a decryption with one entity, prompting while it is locked.
fn try_entity(
    entity: &Entity,
    armored: &[u8],
    passphrases: &mut dyn PassphraseSource,
) -> std::result::Result<Zeroizing<Vec<u8>>, String> {
    if !entity.is_locked() {
        return open(&entity.secret, armored, &Password::from("")).map_err(|e| e.to_string());
    }

    let mut attempt = 0;
    let mut reason = "key is locked and no passphrase was provided".to_string();
    while let Some(passphrase) = passphrases.passphrase(&entity.hint(attempt)) {
        match open(&entity.secret, armored, &Password::from(passphrase.as_str())) {
            Ok(plaintext) => return Ok(plaintext),
            Err(e) => reason = e.to_string(),
        }
        attempt += 1;
    }
    Err(reason)
}

fn open(key: &SignedSecretKey, armored: &[u8], password: &Password) -> pgp::errors::Result<Zeroizing<Vec<u8>>> {
    let (message, _headers) = PgpMessage::from_armor(armored)?;
    let mut message = message.decrypt(password, key)?;
    if message.is_compressed() {
        message = message.decompress()?;
    }
    Ok(Zeroizing::new(message.as_data_vec()?))
}
