//! Cryptographic operations for NoteSafe.
//!
//! - **SHA-256**: PIN verification hash (never used as key material)
//! - **PBKDF2-HMAC-SHA256**: deliberately slow PIN-to-key derivation
//! - **AES-256-GCM**: per-note authenticated encryption
//!
//! ## Security Model
//!
//! - The PIN and the derived key are never persisted
//! - Key material is zeroized from memory on drop
//! - Every encryption uses a fresh random nonce
//!
//! ## Known Weakness
//!
//! The KDF salt is a fixed application-wide constant, so the same PIN yields
//! the same key on every installation. Changing it would make every existing
//! note undecryptable, so it stays fixed until an explicit migration exists.
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the vault database file
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session / memory
//! - Offline brute force of a 4-digit PIN by an attacker holding the file

pub mod cipher;
pub mod key;
pub mod pin;

pub use cipher::{decrypt, encrypt, Envelope, NONCE_LENGTH};
pub use key::{derive_key, hash_pin, verify_pin_hash, PinHash, SessionKey, KEY_LENGTH};
pub use pin::{validate_pin, PIN_LENGTH};
