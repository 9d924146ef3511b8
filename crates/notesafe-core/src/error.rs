//! Error types for NoteSafe core operations.
//!
//! Errors are split by the layer that raises them. Authentication errors are
//! recoverable and normally reported as values by the auth layer; crypto and
//! store errors propagate to the caller as typed failures.

use std::time::Duration;

use thiserror::Error;

use crate::storage::types::{FolderId, NoteId};

/// Result type alias for NoteSafe operations.
pub type Result<T> = std::result::Result<T, NoteSafeError>;

/// Core error type for NoteSafe operations.
#[derive(Debug, Error)]
pub enum NoteSafeError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<rusqlite::Error> for NoteSafeError {
    fn from(source: rusqlite::Error) -> Self {
        NoteSafeError::Store(StoreError::Sqlite { source })
    }
}

/// PIN authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Submitted PIN did not match the stored verification hash
    #[error("Incorrect PIN. {attempts_remaining} attempt(s) remaining")]
    WrongPin { attempts_remaining: u32 },

    /// Too many failed attempts; input is disabled until the countdown ends
    #[error("Too many failed attempts. Try again in {}s", .remaining.as_secs().max(1))]
    LockedOut { remaining: Duration },

    /// Current PIN re-entry failed during a PIN reset
    #[error("Current PIN is incorrect. {attempts_remaining} attempt(s) remaining")]
    ResetVerificationFailed { attempts_remaining: u32 },

    /// PIN does not have the required shape
    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    /// Operation requires an unlocked session
    #[error("Vault is locked")]
    SessionLocked,

    /// Request not valid in the current authentication state
    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
}

/// Key derivation and AEAD failures.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Authentication tag mismatch: wrong key or tampered ciphertext
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Stored nonce has the wrong length
    #[error("Invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonce { expected: usize, actual: usize },

    /// AEAD primitive failure while encrypting
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// KDF primitive failure
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Folder id does not reference a live folder
    #[error("Folder not found: {0}")]
    FolderNotFound(FolderId),

    /// Note id does not exist
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    /// The default folder cannot be deleted
    #[error("The default folder cannot be deleted")]
    ProtectedFolder,

    /// Stored data could not be parsed
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Connection mutex poisoned by a panicking writer
    #[error("SQLite connection poisoned")]
    Poisoned,

    /// SQLite engine failure (I/O, constraint, etc.)
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_out_message_rounds_up_to_one_second() {
        let err = AuthError::LockedOut {
            remaining: Duration::from_millis(200),
        };
        assert_eq!(err.to_string(), "Too many failed attempts. Try again in 1s");
    }

    #[test]
    fn test_sqlite_error_converts_to_store_error() {
        let err: NoteSafeError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(
            err,
            NoteSafeError::Store(StoreError::Sqlite { .. })
        ));
    }
}
