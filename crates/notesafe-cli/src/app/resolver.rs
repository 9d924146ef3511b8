//! Path resolution for config and vault files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, default_vault_path, read_config, NoteSafeConfig};
use crate::constants::env_vars;

/// Resolve the config file path, checking NOTESAFE_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(env_vars::CONFIG) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<NoteSafeConfig> {
    if !path.exists() {
        return Ok(NoteSafeConfig::default());
    }
    read_config(path)
}

/// Resolve the vault path: `--vault`/NOTESAFE_VAULT, then config, then the XDG default.
pub fn resolve_vault_path(cli: &Cli, config: &NoteSafeConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.vault.as_deref() {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = config.vault.path.as_deref() {
        return Ok(PathBuf::from(path));
    }
    default_vault_path()
}

/// Error message when the vault file is missing.
pub fn missing_vault_message(path: &Path) -> String {
    format!("No vault found at {}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_flag_wins_over_config() {
        let cli = Cli::parse_from(["notesafe", "--vault", "/tmp/flag.db", "status"]);
        let mut config = NoteSafeConfig::default();
        config.vault.path = Some("/tmp/config.db".to_string());
        assert_eq!(
            resolve_vault_path(&cli, &config).unwrap(),
            PathBuf::from("/tmp/flag.db")
        );
    }

    #[test]
    fn test_config_path_used_without_flag() {
        let cli = Cli::parse_from(["notesafe", "status"]);
        if cli.vault.is_some() {
            // NOTESAFE_VAULT is set in this environment
            return;
        }
        let mut config = NoteSafeConfig::default();
        config.vault.path = Some("/tmp/config.db".to_string());
        assert_eq!(
            resolve_vault_path(&cli, &config).unwrap(),
            PathBuf::from("/tmp/config.db")
        );
    }

    #[test]
    fn test_missing_config_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.lockout.max_attempts, 5);
    }
}
