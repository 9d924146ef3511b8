//! Status command handler.

use notesafe_core::{AuthState, SecretStore};

use crate::app::{wait_out_lockout, AppContext};
use crate::cli::StatusArgs;
use crate::ui::theme::{styled, styles};
use crate::ui::{badge, format_countdown, header, kv, print, Badge};

pub fn handle_status(ctx: &AppContext, args: &StatusArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let path = ctx.vault_path()?;
    let mut vault = ctx.open_vault()?;

    let waited = if args.wait {
        wait_out_lockout(&mut vault, &ui)?
    } else {
        vault.refresh()?;
        false
    };

    let state = vault.state().clone();
    let policy = vault.auth().policy().clone();
    let remaining = vault.lockout_remaining();
    let attempts_remaining = vault.auth().attempts_remaining();
    let format_version = vault.store().format_version()?;
    let has_pin = vault.store().load_pin_record()?.is_some();

    if ui.mode.is_json() {
        let output = serde_json::json!({
            "vault": path.to_string_lossy(),
            "state": state.name(),
            "initialized": has_pin,
            "attempts_remaining": attempts_remaining,
            "max_attempts": policy.max_attempts,
            "lockout_seconds": policy.duration.as_secs(),
            "lockout_remaining_seconds": remaining.map(|r| r.as_secs_f64().ceil() as u64),
            "format_version": format_version,
            "waited": waited,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if ctx.quiet() {
        println!("{}", state.name());
        return Ok(());
    }

    print(&ui, &header(&ui, "status", None));
    let state_line = match &state {
        AuthState::LockedOut { .. } => badge(&ui, Badge::Warn, "Locked out"),
        AuthState::Uninitialized => badge(&ui, Badge::Info, "No PIN set"),
        _ => badge(&ui, Badge::Ok, "Ready"),
    };
    print(&ui, &state_line);
    print(&ui, &kv(&ui, "Vault", &path.display().to_string()));
    print(&ui, &kv(&ui, "State", state.name()));
    print(
        &ui,
        &kv(
            &ui,
            "Attempts",
            &format!("{} of {} remaining", attempts_remaining, policy.max_attempts),
        ),
    );
    if let Some(remaining) = remaining {
        let countdown = styled(&format_countdown(remaining), styles::warning(), ui.color);
        print(&ui, &kv(&ui, "Lockout", &countdown));
    }
    print(&ui, &kv(&ui, "Format", &format_version));
    Ok(())
}
