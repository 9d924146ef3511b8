//! Opening and unlocking a vault.

use std::path::Path;

use tracing::debug;
use zeroize::Zeroizing;

use notesafe_core::{AuthError, AuthState, LockoutPolicy, PinResponse, SqliteStore, Vault};

use crate::constants::env_vars;
use crate::errors::{CliError, ErrorKind};
use crate::helpers::{env_pin, parse_pin, prompt_pin};

use super::resolver::missing_vault_message;

pub type CliVault = Vault<SqliteStore>;

/// Open an existing vault file.
pub fn open_vault(path: &Path, policy: LockoutPolicy) -> anyhow::Result<CliVault> {
    if !path.exists() {
        return Err(CliError::not_found(
            missing_vault_message(path),
            "Hint: Run `notesafe init` to create a vault.",
        )
        .into());
    }
    let store = SqliteStore::open(path)?;
    let vault = Vault::open(store, policy)?;
    debug!(state = vault.state().name(), "Vault opened");
    Ok(vault)
}

/// Read the current PIN from NOTESAFE_PIN or a hidden prompt.
pub fn current_pin(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(raw) = env_pin(env_vars::PIN) {
        return Ok(parse_pin(&raw)?);
    }
    if !interactive {
        return Err(CliError::auth_failed_with_hint(
            "No PIN provided and no TTY available",
            format!("Hint: Set {} for non-interactive use.", env_vars::PIN),
        )
        .into());
    }
    prompt_pin("PIN")
}

/// Submit one PIN to a locked vault.
pub fn unlock_with_pin(vault: &mut CliVault, pin: &str) -> anyhow::Result<()> {
    if ensure_unlockable(vault)? {
        return Ok(());
    }
    match vault.submit_pin(pin)? {
        PinResponse::Unlocked => Ok(()),
        PinResponse::Rejected(e) => Err(CliError::from_rejection(&e).into()),
        other => Err(anyhow::anyhow!("Unexpected response to unlock: {:?}", other)),
    }
}

/// Unlock with NOTESAFE_PIN, or prompt until the PIN is accepted.
///
/// A PIN from the environment is tried once. Prompting stops at the first
/// lockout.
pub fn unlock_vault(vault: &mut CliVault, interactive: bool) -> anyhow::Result<()> {
    if ensure_unlockable(vault)? {
        return Ok(());
    }
    if env_pin(env_vars::PIN).is_some() || !interactive {
        let pin = current_pin(interactive)?;
        return unlock_with_pin(vault, &pin);
    }

    loop {
        let pin = match prompt_pin("PIN") {
            Ok(pin) => pin,
            Err(e) => match e.downcast_ref::<CliError>() {
                Some(err) if err.kind() == ErrorKind::InvalidInput => {
                    eprintln!("{}", err.message());
                    continue;
                }
                _ => return Err(e),
            },
        };

        match vault.submit_pin(&pin)? {
            PinResponse::Unlocked => return Ok(()),
            PinResponse::Rejected(AuthError::WrongPin { attempts_remaining }) => {
                eprintln!(
                    "Incorrect PIN. {} attempt(s) remaining",
                    attempts_remaining
                );
            }
            PinResponse::Rejected(e) => return Err(CliError::from_rejection(&e).into()),
            other => return Err(anyhow::anyhow!("Unexpected response to unlock: {:?}", other)),
        }
    }
}

/// Fail early for vaults that cannot take a PIN. Returns true when
/// already unlocked.
fn ensure_unlockable(vault: &mut CliVault) -> anyhow::Result<bool> {
    vault.refresh()?;
    match vault.state() {
        AuthState::Uninitialized | AuthState::SettingUp => Err(CliError::not_found(
            "Vault has no PIN yet",
            "Hint: Run `notesafe init` to set one.",
        )
        .into()),
        AuthState::Unlocked => Ok(true),
        AuthState::LockedOut { .. } => {
            let remaining = vault.lockout_remaining().unwrap_or_default();
            Err(CliError::from_rejection(&AuthError::LockedOut { remaining }).into())
        }
        AuthState::Locked => Ok(false),
        AuthState::ResettingPin(_) => Err(anyhow::anyhow!("A PIN change is in progress")),
    }
}
