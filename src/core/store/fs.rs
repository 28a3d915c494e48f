//! Filesystem secret storage.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::cipher::Message;
use crate::error::{Result, StoreError};

/// Owner read/write only.
#[cfg(unix)]
const SECRET_MODE: u32 = 0o600;

/// Write an encrypted message to a new file.
///
/// The file must not exist yet. It is created with mode `0600` on Unix
/// and the permissions are re-applied before any content is written.
///
/// # Errors
///
/// - `StoreError::RefusePlaintextWrite` if the message is not encrypted
/// - `StoreError::EmptyMessage` if the message has no content
/// - `StoreError::FileExists` if `path` already exists
/// - `StoreError::Permission` if permissions cannot be restricted
/// - `StoreError::WriteFailed` for any other I/O failure
pub fn write_secret(path: &Path, message: &Message) -> Result<()> {
    if !message.is_encrypted() {
        return Err(StoreError::RefusePlaintextWrite.into());
    }
    if message.is_empty() {
        return Err(StoreError::EmptyMessage.into());
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(SECRET_MODE);
    }

    let mut file = options.open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => StoreError::FileExists(path.to_path_buf()),
        _ => StoreError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    // Umask may have narrowed or widened the create mode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(SECRET_MODE))
            .map_err(|e| StoreError::Permission {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    file.write_all(message.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| StoreError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!(path = %path.display(), bytes = message.len(), "secret written");
    Ok(())
}

/// Read an armored secret file into an encrypted message.
///
/// # Errors
///
/// Returns `StoreError::ReadFailed` if the file cannot be read.
pub fn read_secret(path: &Path) -> Result<Message> {
    let bytes = fs::read(path).map_err(|e| StoreError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    check_permissions(path);

    debug!(path = %path.display(), bytes = bytes.len(), "secret read");
    Ok(Message::armored(bytes))
}

#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode != SECRET_MODE {
            warn!(
                path = %path.display(),
                mode = format!("{:o}", mode),
                "secret file is readable by others"
            );
        }
    }
}
