//! OpenPGP keys generated at test time.

use std::sync::OnceLock;

use pgp::composed::{KeyType, SecretKeyParamsBuilder, SubkeyParamsBuilder};
use pgp::crypto::ecc_curve::ECCCurve;
use pgp::types::Password;
use rand::thread_rng;

/// Generate an armored Ed25519 key with a Curve25519 encryption subkey.
pub fn generate_key(user_id: &str, passphrase: Option<&str>) -> String {
    let mut encrypt = SubkeyParamsBuilder::default();
    encrypt
        .key_type(KeyType::ECDH(ECCCurve::Curve25519))
        .can_sign(false)
        .can_encrypt(true)
        .can_authenticate(false);

    let mut params = SecretKeyParamsBuilder::default();
    params
        .key_type(KeyType::Ed25519Legacy)
        .can_certify(true)
        .can_sign(true)
        .can_encrypt(false)
        .primary_user_id(user_id.into())
        .passphrase(passphrase.map(str::to_string))
        .subkeys(vec![encrypt.build().unwrap()]);

    let secret = params.build().unwrap().generate(thread_rng()).unwrap();
    let signed = secret
        .sign(&mut thread_rng(), &Password::from(passphrase.unwrap_or("")))
        .unwrap();
    signed.to_armored_string(Default::default()).unwrap()
}

/// Shared unprotected key, generated once per test binary.
pub fn test_key() -> String {
    static KEY: OnceLock<String> = OnceLock::new();
    KEY.get_or_init(|| generate_key("Test User <test@example.com>", None))
        .clone()
}

/// Shared passphrase-protected key; the passphrase is `open sesame`.
pub fn protected_key() -> String {
    static KEY: OnceLock<String> = OnceLock::new();
    KEY.get_or_init(|| generate_key("Locked User <locked@example.com>", Some(PASSPHRASE)))
        .clone()
}

pub const PASSPHRASE: &str = "open sesame";
