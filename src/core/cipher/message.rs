//! Message payloads.

use zeroize::Zeroizing;

/// A byte payload that is either plaintext or armored OpenPGP ciphertext.
///
/// Messages are never converted in place: encryption and decryption return
/// new values. The buffer is zeroized on drop.
#[derive(Clone)]
pub struct Message {
    bytes: Zeroizing<Vec<u8>>,
    encrypted: bool,
}

impl Message {
    /// A plaintext message.
    pub fn plaintext(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.into()),
            encrypted: false,
        }
    }

    /// An armored, encrypted message.
    pub fn armored(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.into()),
            encrypted: true,
        }
    }

    /// Whether the payload is ciphertext.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Plaintext never reaches logs or panic messages.
        f.debug_struct("Message")
            .field("encrypted", &self.encrypted)
            .field("len", &self.bytes.len())
            .finish()
    }
}
