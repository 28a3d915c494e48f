//! Secret commands (add, show, list, rm, tag, restore).
//!
//! `add` and `show` unlock the private key through a [`Vault`]; the others
//! only move refs and go straight to the [`Repository`].

use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;

use dialoguer::{Confirm, Password};
use tracing::debug;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::core::cipher::TerminalPrompt;
use crate::core::config::Config;
use crate::core::repo::Repository;
use crate::core::vault::Vault;
use crate::error::Result;

/// Store a new secret from a file, stdin, or a hidden prompt.
pub fn add(name: &str, file: Option<&Path>) -> Result<()> {
    let config = Config::load()?;

    let value = match file {
        Some(path) => Zeroizing::new(std::fs::read(path)?),
        None if !io::stdin().is_terminal() => {
            let mut input = Zeroizing::new(Vec::new());
            io::stdin().read_to_end(&mut input)?;
            if input.ends_with(b"\n") {
                input.pop();
            }
            input
        }
        None => {
            let value = Zeroizing::new(
                Password::new()
                    .with_prompt(format!("Value for {}", output::name(name)))
                    .interact()?,
            );
            Zeroizing::new(value.as_bytes().to_vec())
        }
    };
    debug!(secret = name, bytes = value.len(), "read secret value");

    let mut prompt = TerminalPrompt::default();
    let mut vault = Vault::open(&config, &mut prompt)?;
    let id = vault.add(name, &value)?;

    output::success(&format!("added {} ({})", output::name(name), id.short()));
    Ok(())
}

/// Decrypt a secret to stdout.
pub fn show(name: &str) -> Result<()> {
    let config = Config::load()?;

    let mut prompt = TerminalPrompt::default();
    let mut vault = Vault::open(&config, &mut prompt)?;
    let plaintext = vault.reveal(name, &mut prompt)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(plaintext.as_bytes())?;
    if io::stdout().is_terminal() && !plaintext.as_bytes().ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

/// List secret names.
pub fn list(json: bool) -> Result<()> {
    let config = Config::load()?;
    let repo = Repository::open(&config.repository)?;
    let names = repo.list_branches();

    if json {
        let output = serde_json::json!({
            "secrets": names,
            "count": names.len()
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if names.is_empty() {
        output::dimmed("no secrets stored");
    } else {
        let current = repo.current_branch();
        for name in &names {
            if current.as_deref() == Some(name.as_str()) {
                println!("* {}", name);
            } else {
                output::list_item(name);
            }
        }
    }

    Ok(())
}

/// Remove a secret's branch.
pub fn rm(name: &str, yes: bool) -> Result<()> {
    let config = Config::load()?;
    let mut repo = Repository::open(&config.repository)?;

    if !yes && io::stdin().is_terminal() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {}? Tags are kept", output::name(name)))
            .default(false)
            .interact()?;
        if !confirmed {
            output::dimmed("aborted");
            return Ok(());
        }
    }

    repo.remove_branch(name)?;
    output::success(&format!("removed {}", output::name(name)));
    Ok(())
}

/// Tag the tip of a secret as a version.
pub fn tag(version: &str, name: &str) -> Result<()> {
    let config = Config::load()?;
    let mut repo = Repository::open(&config.repository)?;

    if repo.tag_exists(version) {
        output::warn(&format!("moving existing version {}", output::name(version)));
    }
    repo.add_tag_branch(version, name)?;

    output::success(&format!("tagged {} as {}", output::name(name), output::name(version)));
    Ok(())
}

/// Check out a version as the branch of the same name.
pub fn restore(version: &str) -> Result<()> {
    let config = Config::load()?;
    let mut repo = Repository::open(&config.repository)?;

    let create = !repo.branch_exists(version);
    repo.tag_branch(version, create)?;

    if create {
        output::success(&format!("restored {} as a new secret", output::name(version)));
        output::dimmed(&format!("show it with: {}", output::cmd(&format!("gpass show {}", version))));
    } else {
        output::success(&format!("reset {} to its tagged version", output::name(version)));
    }
    Ok(())
}
