//! Secret name validation.
//!
//! A secret name becomes a branch name, so it must be a single valid git
//! ref component.

use crate::error::{Result, VaultError};

/// Characters git refuses in ref names.
const FORBIDDEN: &[char] = &['/', '\\', '~', '^', ':', '?', '*', '['];

/// Validate a secret name.
///
/// Rejects:
/// - empty names
/// - `/` and the other characters git refuses in refs
/// - whitespace and control characters
/// - a leading `-` or `.`
/// - `..`, `@{` and a `.lock` suffix
///
/// # Errors
///
/// Returns `VaultError::InvalidName` with the first rule that failed.
pub fn validate_name(name: &str) -> Result<()> {
    let reject = |reason: &'static str| -> Result<()> {
        Err(VaultError::InvalidName {
            name: name.to_string(),
            reason,
        }
        .into())
    };

    if name.is_empty() {
        return reject("name cannot be empty");
    }
    if name.contains('/') {
        return reject("name cannot contain '/'");
    }
    if name.contains(FORBIDDEN) {
        return reject("name contains a character git does not allow in branch names");
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return reject("name cannot contain whitespace or control characters");
    }
    if name.starts_with('-') {
        return reject("name cannot start with '-'");
    }
    if name.starts_with('.') {
        return reject("name cannot start with '.'");
    }
    if name.contains("..") {
        return reject("name cannot contain '..'");
    }
    if name.contains("@{") || name == "@" {
        return reject("name cannot contain '@{' or be '@'");
    }
    if name.ends_with(".lock") {
        return reject("name cannot end with '.lock'");
    }

    Ok(())
}
