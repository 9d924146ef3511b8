//! Errors that end a command with a specific exit code.
//!
//! Handlers return `anyhow::Result`. `main` looks for a `CliError` (or a
//! core `NoteSafeError`) in the chain to pick the exit code; anything else
//! exits with 1.

use std::fmt;

use notesafe_core::{AuthError, NoteSafeError, StoreError};

use crate::constants::exit_codes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Vault, folder, note or attachment does not exist
    NotFound,
    /// Bad arguments, malformed PIN, missing confirmation
    InvalidInput,
    /// Wrong PIN, lockout, or no way to ask for a PIN
    AuthFailed,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::NotFound => exit_codes::NOT_FOUND,
            ErrorKind::InvalidInput => exit_codes::INVALID_INPUT,
            ErrorKind::AuthFailed => exit_codes::AUTH_FAILED,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    kind: ErrorKind,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message).with_hint(hint)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthFailed, message).with_hint(hint)
    }

    /// Map a rejected PIN submission to an exit code and hint.
    pub fn from_rejection(error: &AuthError) -> Self {
        let message = error.to_string();
        match error {
            AuthError::LockedOut { .. } => Self::auth_failed_with_hint(
                message,
                "Hint: Run `notesafe status --wait` to wait out the lockout.",
            ),
            AuthError::InvalidPin(_) => Self::invalid_input(message),
            _ => Self::new(ErrorKind::AuthFailed, message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    /// The hint goes on its own line so `main` can split it off again.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n{}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for CliError {}

/// Exit code for any error that reached `main`.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(cli_error) = error.downcast_ref::<CliError>() {
        return cli_error.kind().exit_code();
    }
    let kind = match error.downcast_ref::<NoteSafeError>() {
        Some(NoteSafeError::Store(StoreError::FolderNotFound(_) | StoreError::NoteNotFound(_))) => {
            ErrorKind::NotFound
        }
        Some(
            NoteSafeError::Store(StoreError::ProtectedFolder)
            | NoteSafeError::InvalidInput(_)
            | NoteSafeError::Auth(AuthError::InvalidPin(_)),
        ) => ErrorKind::InvalidInput,
        Some(NoteSafeError::Auth(_)) => ErrorKind::AuthFailed,
        _ => return exit_codes::FAILURE,
    };
    kind.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::not_found("x", "y").kind().exit_code(), 3);
        assert_eq!(CliError::invalid_input("x").kind().exit_code(), 4);
        assert_eq!(CliError::auth_failed_with_hint("x", "y").kind().exit_code(), 5);
    }

    #[test]
    fn test_display_puts_hint_on_next_line() {
        let err = CliError::not_found("No vault found at /tmp/v.db", "Hint: Run `notesafe init`");
        assert_eq!(err.to_string(), "No vault found at /tmp/v.db\nHint: Run `notesafe init`");
        assert_eq!(CliError::invalid_input("bad id").to_string(), "bad id");
    }

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let missing = anyhow::Error::from(NoteSafeError::from(StoreError::NoteNotFound(9)));
        assert_eq!(exit_code_for(&missing), exit_codes::NOT_FOUND);

        let protected = anyhow::Error::from(NoteSafeError::from(StoreError::ProtectedFolder));
        assert_eq!(exit_code_for(&protected), exit_codes::INVALID_INPUT);

        let locked = anyhow::Error::from(NoteSafeError::from(AuthError::SessionLocked));
        assert_eq!(exit_code_for(&locked), exit_codes::AUTH_FAILED);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(exit_code_for(&other), exit_codes::FAILURE);
    }

    #[test]
    fn test_lockout_rejection_carries_hint() {
        let err = CliError::from_rejection(&AuthError::LockedOut {
            remaining: Duration::from_secs(12),
        });
        assert_eq!(err.kind(), ErrorKind::AuthFailed);
        assert!(err.to_string().contains("status --wait"));
    }

    #[test]
    fn test_malformed_pin_is_invalid_input() {
        let err = CliError::from_rejection(&AuthError::InvalidPin("too short".to_string()));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
