//! Passphrase sources.
//!
//! The keyring asks a [`PassphraseSource`] whenever it meets locked key
//! material. The default [`TerminalPrompt`] reads from the controlling
//! terminal with echo disabled; [`ScriptedPassphrases`] replays a fixed
//! list for tests and non-interactive callers.

use std::collections::VecDeque;

use dialoguer::Password;
use tracing::warn;
use zeroize::Zeroizing;

use crate::core::constants;

/// The key a passphrase is being requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    /// Identifier of the entity's primary key.
    pub key_id: String,
    /// Zero-based number of passphrases already tried for this key.
    pub attempt: usize,
}

impl std::fmt::Display for KeyHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key_id)
    }
}

/// Supplies passphrases for locked private keys.
pub trait PassphraseSource {
    /// Next passphrase to try for `key`, or `None` once the source is
    /// exhausted for that key.
    fn passphrase(&mut self, key: &KeyHint) -> Option<Zeroizing<String>>;
}

/// Interactive prompt on the controlling terminal, echo disabled.
///
/// Asks once per attempt and never caches a passphrase across keys.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    max_attempts: usize,
}

impl TerminalPrompt {
    /// Prompt at most `max_attempts` times per key.
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new(constants::MAX_PASSPHRASE_ATTEMPTS)
    }
}

impl PassphraseSource for TerminalPrompt {
    fn passphrase(&mut self, key: &KeyHint) -> Option<Zeroizing<String>> {
        if key.attempt >= self.max_attempts {
            return None;
        }

        let prompt = if key.attempt == 0 {
            format!("Enter passphrase for {}", key)
        } else {
            format!("Wrong passphrase, try again for {}", key)
        };

        match Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
        {
            Ok(passphrase) => Some(Zeroizing::new(passphrase)),
            Err(e) => {
                warn!(error = %e, "passphrase prompt failed");
                None
            }
        }
    }
}

/// Replays a fixed list of passphrases, then reports exhaustion.
///
/// Each passphrase is handed out once regardless of which key asks.
#[derive(Default)]
pub struct ScriptedPassphrases {
    queue: VecDeque<Zeroizing<String>>,
}

impl ScriptedPassphrases {
    /// Source yielding `passphrases` in order.
    pub fn new<I, S>(passphrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: passphrases
                .into_iter()
                .map(|p| Zeroizing::new(p.into()))
                .collect(),
        }
    }

    /// Passphrases not handed out yet.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl PassphraseSource for ScriptedPassphrases {
    fn passphrase(&mut self, _key: &KeyHint) -> Option<Zeroizing<String>> {
        self.queue.pop_front()
    }
}

/// Source that never has a passphrase, for unprotected keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPassphrase;

impl PassphraseSource for NoPassphrase {
    fn passphrase(&mut self, _key: &KeyHint) -> Option<Zeroizing<String>> {
        None
    }
}
