//! The TOML config file: where the vault lives and the lockout policy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use notesafe_core::{LockoutPolicy, NoteSafeError};

use crate::errors::CliError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoteSafeConfig {
    #[serde(default)]
    pub vault: VaultSection,
    #[serde(default)]
    pub lockout: LockoutSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VaultSection {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockoutSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,
}

impl Default for LockoutSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            duration_seconds: default_duration_seconds(),
        }
    }
}

impl LockoutSection {
    /// The policy these settings describe, rejecting out-of-range values.
    pub fn policy(&self) -> anyhow::Result<LockoutPolicy> {
        let duration = Duration::from_secs(self.duration_seconds);
        LockoutPolicy::new(self.max_attempts, duration).map_err(|e| {
            let reason = match e {
                NoteSafeError::InvalidInput(reason) => reason,
                other => other.to_string(),
            };
            CliError::invalid_input(format!("Invalid [lockout] settings: {}", reason)).into()
        })
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_duration_seconds() -> u64 {
    30
}

impl NoteSafeConfig {
    pub fn new(vault_path: PathBuf, max_attempts: u32, duration_seconds: u64) -> Self {
        Self {
            vault: VaultSection {
                path: Some(vault_path.to_string_lossy().to_string()),
            },
            lockout: LockoutSection {
                max_attempts,
                duration_seconds,
            },
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(app_dir("XDG_CONFIG_HOME", &[".config"])?.join("config.toml"))
}

pub fn default_vault_path() -> anyhow::Result<PathBuf> {
    Ok(app_dir("XDG_DATA_HOME", &[".local", "share"])?.join("vault.db"))
}

/// `$XDG_*_HOME/notesafe`, or `~/<fallback>/notesafe` when the variable is
/// unset or blank.
fn app_dir(xdg_var: &str, fallback: &[&str]) -> anyhow::Result<PathBuf> {
    let base = match std::env::var_os(xdg_var).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let home = std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("HOME is not set; cannot locate {}", xdg_var))?;
            fallback.iter().fold(PathBuf::from(home), |dir, part| dir.join(part))
        }
    };
    Ok(base.join("notesafe"))
}

pub fn read_config(path: &Path) -> anyhow::Result<NoteSafeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config {}", path.display()))?;
    let config: NoteSafeConfig =
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))?;
    config.lockout.policy()?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &NoteSafeConfig) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    let raw = toml::to_string_pretty(config).context("Cannot serialize config")?;
    std::fs::write(path, raw).with_context(|| format!("Cannot write config {}", path.display()))
}
