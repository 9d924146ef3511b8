//! Init command handler.

use std::path::PathBuf;

use tracing::info;

use notesafe_core::{AuthState, PinResponse, SqliteStore, Vault};

use crate::app::{load_config, resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::write_config;
use crate::constants::env_vars;
use crate::errors::CliError;
use crate::helpers::prompt_new_pin;
use crate::ui::{hint, print, receipt};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let config_path = resolve_config_path()?;
    let mut config = load_config(&config_path)?;

    let vault_path = match args.path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => ctx.vault_path()?,
    };
    if let Some(max_attempts) = args.max_attempts {
        config.lockout.max_attempts = max_attempts;
    }
    if let Some(seconds) = args.lockout_seconds {
        config.lockout.duration_seconds = seconds;
    }

    let policy = config.lockout.policy()?;

    if let Some(parent) = vault_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create directory {}: {}", parent.display(), e)
            })?;
        }
    }

    let store = SqliteStore::open(&vault_path)?;
    let mut vault = Vault::open(store, policy)?;
    if vault.state() != &AuthState::Uninitialized {
        return Err(CliError::invalid_input(format!(
            "A vault with a PIN already exists at {}\nHint: Run `notesafe reset` to start over.",
            vault_path.display()
        ))
        .into());
    }

    let pin = prompt_new_pin(env_vars::PIN, ctx.interactive())?;
    vault.begin_setup()?;
    match vault.submit_pin(&pin)? {
        PinResponse::Unlocked => {}
        PinResponse::Rejected(e) => return Err(CliError::from_rejection(&e).into()),
        other => return Err(anyhow::anyhow!("Unexpected response to setup: {:?}", other)),
    }
    vault.request_lock()?;

    config.vault.path = Some(vault_path.to_string_lossy().to_string());
    write_config(&config_path, &config)?;
    info!(path = %vault_path.display(), "Vault initialized");

    if ui.mode.is_json() {
        let output = serde_json::json!({
            "status": "ok",
            "vault": vault_path.to_string_lossy(),
            "config": config_path.to_string_lossy(),
            "max_attempts": config.lockout.max_attempts,
            "lockout_seconds": config.lockout.duration_seconds,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if ctx.quiet() {
        return Ok(());
    }

    let vault_display = vault_path.display().to_string();
    let config_display = config_path.display().to_string();
    print(
        &ui,
        &receipt(
            &ui,
            "Vault created",
            &[("Vault", &vault_display), ("Config", &config_display)],
        ),
    );
    print(&ui, &hint(&ui, "notesafe add \"first note\""));
    Ok(())
}
