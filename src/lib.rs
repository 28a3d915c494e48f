//! gpass - a git-backed store for OpenPGP-encrypted secrets.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── init          # Load repository + private key, write session config
//! │   ├── secrets       # add / show / list / rm / tag / restore
//! │   ├── completions   # Shell completions
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── cipher/       # OpenPGP keyring, messages, passphrase sources
//!     ├── store/        # Write-once secret files
//!     ├── repo/         # Branch/tag/commit state machine
//!     │   ├── git       # libgit2 backend
//!     │   └── memory    # In-memory backend
//!     ├── vault         # Secret lifecycle (encrypt + commit, checkout + decrypt)
//!     ├── identity      # Commit author
//!     └── config        # Session configuration (config.json)
//! ```
//!
//! Every secret lives on its own branch (`refs/heads/<name>`) as a single
//! armored `PGP MESSAGE` file. Versions are frozen as lightweight tags
//! (`refs/tags/<version>`) and can be promoted back into branches.

pub mod cli;
pub mod core;
pub mod error;
