//! Application-level utilities for the NoteSafe CLI.
//!
//! This module provides:
//! - Path resolution for config and vault files
//! - Opening and unlocking a vault with PIN handling
//! - The lockout countdown timer

mod context;
mod countdown;
mod resolver;
mod unlock;

pub use context::AppContext;
pub use countdown::wait_out_lockout;
pub use resolver::{load_config, resolve_config_path};
pub use unlock::{current_pin, open_vault, unlock_vault, unlock_with_pin, CliVault};
