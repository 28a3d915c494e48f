//! OpenPGP crypto engine.
//!
//! A [`Keyring`] is the session object: it is built from one or more
//! armored private keys and then used by reference to encrypt and decrypt
//! [`Message`] values. Passphrases are obtained through a
//! [`PassphraseSource`], which defaults to an interactive terminal prompt.
//!
//! ## Example
//!
//! ```ignore
//! use gpass::core::cipher::{Keyring, Message, TerminalPrompt};
//!
//! let mut prompt = TerminalPrompt::default();
//! let keyring = Keyring::from_armored(&private_key, &mut prompt)?;
//!
//! let sealed = keyring.encrypt(&Message::plaintext("hunter2"))?;
//! let opened = keyring.decrypt(&sealed, &mut prompt)?;
//! assert_eq!(opened.as_bytes(), b"hunter2");
//! ```

mod armor;
mod keyring;
mod message;
mod prompt;

pub use armor::block_type;
pub use keyring::Keyring;
pub use message::Message;
pub use prompt::{KeyHint, NoPassphrase, PassphraseSource, ScriptedPassphrases, TerminalPrompt};
