//! Exit codes, environment variables and timing constants.

/// 0 is success and 2 is clap's usage error. The rest are ours.
pub mod exit_codes {
    /// Anything without a more specific code.
    pub const FAILURE: i32 = 1;

    pub const NOT_FOUND: i32 = 3;

    /// Bad arguments, malformed PIN, refused confirmation.
    pub const INVALID_INPUT: i32 = 4;

    /// Wrong PIN or lockout.
    pub const AUTH_FAILED: i32 = 5;
}

/// Environment variables read by the CLI.
pub mod env_vars {
    pub const PIN: &str = "NOTESAFE_PIN";
    pub const NEW_PIN: &str = "NOTESAFE_NEW_PIN";
    pub const CONFIG: &str = "NOTESAFE_CONFIG";
    pub const LOG: &str = "NOTESAFE_LOG";
}

/// Log filter used when `NOTESAFE_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Seconds between countdown updates while waiting out a lockout.
pub const COUNTDOWN_TICK_SECS: u64 = 1;
