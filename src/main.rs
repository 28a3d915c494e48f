//! gpass - OpenPGP secrets stored as git branches.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gpass::cli::output;
use gpass::cli::{execute, Cli};
use gpass::core::constants;
use gpass::error::{ConfigError, Error, IdentityError, KeyringError, RepoError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("gpass=debug")
        } else {
            EnvFilter::new("gpass=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli.command) {
        output::error(&e.to_string());
        if let Some(hint) = hint(&e) {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

fn hint(err: &Error) -> Option<&'static str> {
    match err {
        Error::Config(ConfigError::NotInitialized) => Some("run: gpass init <repository> --key <private-key>"),
        Error::Identity(IdentityError::MissingEmail(_)) => {
            Some("run: git config --global user.email <you@example.com>")
        }
        Error::Repo(RepoError::RepositoryNotFound(_)) => Some("create one with: git init"),
        Error::Repo(RepoError::Worktree { .. }) => Some("commit or discard changes in the secret repository"),
        Error::Keyring(KeyringError::KeyDecryptFailed { .. }) => Some("check the passphrase of the private key"),
        _ => None,
    }
}
