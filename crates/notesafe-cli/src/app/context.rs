//! Application context for the NoteSafe CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config file.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use crate::cli::Cli;
use crate::config::NoteSafeConfig;
use crate::ui::{DisplayFlags, UiContext};

use super::resolver::{load_config, resolve_config_path, resolve_vault_path};
use super::unlock::{open_vault, unlock_vault, CliVault};

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<NoteSafeConfig>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Get the configuration, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&NoteSafeConfig> {
        self.config
            .get_or_try_init(|| load_config(&resolve_config_path()?))
    }

    pub fn ui_context(&self) -> UiContext {
        UiContext::detect(DisplayFlags {
            json: self.cli.json,
            format: self.cli.format,
            no_color: self.cli.no_color,
            ascii: self.cli.ascii,
        })
    }

    /// Whether prompts may be shown.
    pub fn interactive(&self) -> bool {
        !self.cli.no_input && self.ui_context().is_interactive()
    }

    pub fn vault_path(&self) -> anyhow::Result<PathBuf> {
        resolve_vault_path(self.cli, self.config()?)
    }

    /// Open the vault without unlocking it.
    pub fn open_vault(&self) -> anyhow::Result<CliVault> {
        open_vault(&self.vault_path()?, self.config()?.lockout.policy()?)
    }

    /// Open the vault and unlock it with a PIN.
    pub fn unlock_vault(&self) -> anyhow::Result<CliVault> {
        let mut vault = self.open_vault()?;
        unlock_vault(&mut vault, self.interactive())?;
        Ok(vault)
    }
}
