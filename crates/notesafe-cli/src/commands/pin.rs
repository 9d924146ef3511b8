//! PIN change and factory reset handlers.

use notesafe_core::{AuthState, PinResponse};

use crate::app::{current_pin, unlock_with_pin, AppContext, CliVault};
use crate::constants::env_vars;
use crate::errors::CliError;
use crate::helpers::{confirm, prompt_new_pin};
use crate::ui::{hint, print, receipt};

pub fn handle_change_pin(ctx: &AppContext) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let interactive = ctx.interactive();
    let mut vault = ctx.open_vault()?;

    let current = current_pin(interactive)?;
    unlock_with_pin(&mut vault, &current)?;

    vault.request_pin_reset()?;
    match vault.submit_pin(&current)? {
        PinResponse::AwaitingNewPin => {}
        PinResponse::Rejected(e) => {
            return Err(abandon_reset(&mut vault, CliError::from_rejection(&e)));
        }
        other => return Err(anyhow::anyhow!("Unexpected response to PIN check: {:?}", other)),
    }

    let new_pin = match prompt_new_pin(env_vars::NEW_PIN, interactive) {
        Ok(pin) => pin,
        Err(e) => {
            vault.cancel_pin_reset()?;
            return Err(e);
        }
    };

    let (reencrypted, skipped) = match vault.submit_pin(&new_pin)? {
        PinResponse::PinChanged {
            reencrypted,
            skipped,
        } => (reencrypted, skipped),
        PinResponse::Rejected(e) => {
            return Err(abandon_reset(&mut vault, CliError::from_rejection(&e)));
        }
        other => return Err(anyhow::anyhow!("Unexpected response to new PIN: {:?}", other)),
    };

    if ui.mode.is_json() {
        let output = serde_json::json!({
            "status": "ok",
            "reencrypted": reencrypted,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet() {
        let reencrypted = reencrypted.to_string();
        let skipped = skipped.to_string();
        print(
            &ui,
            &receipt(
                &ui,
                "PIN changed",
                &[("Re-encrypted", &reencrypted), ("Skipped", &skipped)],
            ),
        );
    }
    Ok(())
}

/// Leave the reset state before reporting a failure.
fn abandon_reset(vault: &mut CliVault, error: CliError) -> anyhow::Error {
    if let AuthState::ResettingPin(_) = vault.state() {
        if let Err(e) = vault.cancel_pin_reset() {
            return e.into();
        }
    }
    error.into()
}

pub fn handle_reset(ctx: &AppContext, yes: bool) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let mut vault = ctx.open_vault()?;

    if !confirm(
        "Erase every note and folder and forget the PIN?",
        yes,
        ctx.interactive(),
    )? {
        print(&ui, "Cancelled.");
        return Ok(());
    }
    vault.factory_reset()?;

    if ui.mode.is_json() {
        let output = serde_json::json!({ "status": "ok", "state": vault.state().name() });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet() {
        let path = ctx.vault_path()?.display().to_string();
        print(&ui, &receipt(&ui, "Vault erased", &[("Vault", &path)]));
        print(&ui, &hint(&ui, "notesafe init"));
    }
    Ok(())
}
