//! Command-line interface.

pub mod completions;
pub mod init;
pub mod output;
pub mod secrets;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::error::Result;

/// gpass - secrets in git, one branch per secret.
#[derive(Parser)]
#[command(
    name = "gpass",
    about = "OpenPGP-encrypted secrets stored as git branches, versioned as tags",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Point gpass at a secret repository and a private key
    Init {
        /// Worktree root of an existing git repository
        repository: PathBuf,
        /// Armored OpenPGP private key file
        #[arg(short, long)]
        key: PathBuf,
    },

    /// Store a new secret (reads stdin when piped)
    Add {
        /// Secret name
        name: String,
        /// Read the secret from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Decrypt a secret to stdout
    Show {
        /// Secret name
        name: String,
    },

    /// List stored secrets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a secret (its tags are kept)
    Rm {
        /// Secret name
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Freeze the current state of a secret as a version
    Tag {
        /// Version name
        version: String,
        /// Secret name
        name: String,
    },

    /// Check out a version as a branch of the same name
    Restore {
        /// Version name
        version: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Shell types for completions.
#[derive(Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// Run a parsed command.
pub fn execute(command: Command) -> Result<()> {
    match command {
        Command::Init { repository, key } => init::execute(&repository, &key),
        Command::Add { name, file } => secrets::add(&name, file.as_deref()),
        Command::Show { name } => secrets::show(&name),
        Command::List { json } => secrets::list(json),
        Command::Rm { name, yes } => secrets::rm(&name, yes),
        Command::Tag { version, name } => secrets::tag(&version, &name),
        Command::Restore { version } => secrets::restore(&version),
        Command::Completions { shell } => completions::execute(shell),
    }
}
