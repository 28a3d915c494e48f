//! Secret file persistence.
//!
//! Secrets live on disk only as armored OpenPGP messages. Writes are
//! create-only with owner-only permissions; plaintext never reaches a file.

mod fs;

pub use fs::{read_secret, write_secret};
