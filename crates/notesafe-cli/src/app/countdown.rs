//! Lockout countdown timer.
//!
//! Drives `Vault::refresh` from a periodic tokio interval and returns as
//! soon as the lockout expires.

use std::io::Write;
use std::time::Duration;

use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::constants::COUNTDOWN_TICK_SECS;
use crate::ui::theme::{styled, styles};
use crate::ui::{format_countdown, UiContext};

use super::unlock::CliVault;

/// Block until the vault's lockout (if any) has expired.
///
/// Returns whether there was a lockout to wait for.
pub fn wait_out_lockout(vault: &mut CliVault, ui: &UiContext) -> anyhow::Result<bool> {
    vault.refresh()?;
    if vault.lockout_remaining().is_none() {
        return Ok(false);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to start timer: {}", e))?;
    runtime.block_on(countdown(vault, ui))?;
    Ok(true)
}

async fn countdown(vault: &mut CliVault, ui: &UiContext) -> anyhow::Result<()> {
    let tick = Duration::from_secs(COUNTDOWN_TICK_SECS);
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let live = ui.mode.is_pretty();
    let mut announced = false;

    loop {
        vault.refresh()?;
        let Some(remaining) = vault.lockout_remaining() else {
            break;
        };

        if live {
            let line = format!("Locked out. Try again in {}", format_countdown(remaining));
            eprint!("\r{}", styled(&line, styles::warning(), ui.color));
            let _ = std::io::stderr().flush();
        } else if !announced && !ui.mode.is_json() {
            eprintln!("lockout_remaining={}", format_countdown(remaining));
        }
        announced = true;

        // Wake on the next tick, or exactly at expiry if that comes first
        tokio::select! {
            _ = ticker.tick() => {}
            _ = sleep(remaining) => {}
        }
    }

    if live && announced {
        eprintln!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notesafe_core::{LockoutPolicy, PinResponse, SqliteStore, Vault};

    use crate::ui::mode::OutputMode;

    fn plain_ui() -> UiContext {
        UiContext::fixed(OutputMode::Json)
    }

    #[test]
    fn test_no_lockout_returns_immediately() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut vault = Vault::open(store, LockoutPolicy::default()).unwrap();
        assert_eq!(vault.submit_pin("1234").unwrap(), PinResponse::Unlocked);
        assert!(!wait_out_lockout(&mut vault, &plain_ui()).unwrap());
    }

    #[test]
    fn test_waits_until_lockout_expires() {
        let store = SqliteStore::open_in_memory().unwrap();
        let policy = LockoutPolicy::new(1, Duration::from_millis(300)).unwrap();
        let mut vault = Vault::open(store, policy).unwrap();
        assert_eq!(vault.submit_pin("1234").unwrap(), PinResponse::Unlocked);
        vault.request_lock().unwrap();
        vault.submit_pin("0000").unwrap();
        assert!(vault.lockout_remaining().is_some());

        let started = std::time::Instant::now();
        assert!(wait_out_lockout(&mut vault, &plain_ui()).unwrap());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(vault.lockout_remaining().is_none());
        assert_eq!(vault.submit_pin("1234").unwrap(), PinResponse::Unlocked);
    }
}
