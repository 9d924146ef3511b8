//! # NoteSafe Core
//!
//! Core library for NoteSafe - a local, PIN-gated, encrypted note vault.
//!
//! This crate provides the authentication state machine, per-note envelope
//! encryption, and the folder/note persistence store, independent of the
//! CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: PIN hashing, key derivation, AEAD envelopes
//! - **auth**: Lockout policy and the PIN state machine
//! - **storage**: Storage traits and the SQLite implementation
//! - **vault**: Session handling and the note/folder operations used by a UI

pub mod auth;
pub mod crypto;
pub mod error;
pub mod storage;
pub mod vault;

pub use auth::{AuthController, AuthState, LockoutPolicy, PinPad, ResetStage};
pub use error::{AuthError, CryptoError, NoteSafeError, Result, StoreError};
pub use storage::{Attachment, Folder, FolderSummary, NoteStore, SecretStore, SqliteStore};
pub use vault::{NoteBody, NoteView, PinResponse, Session, Vault};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
