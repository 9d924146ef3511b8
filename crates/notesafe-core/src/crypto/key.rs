//! PIN hashing and key derivation.
//!
//! The verification hash and the encryption key come from independent
//! derivations: a plain SHA-256 digest for checking the PIN, and
//! PBKDF2-HMAC-SHA256 with a high iteration count for the key. Knowing the
//! stored hash does not hand out the key.

use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, Result, StoreError};

/// PBKDF2 iteration count.
///
/// High enough to make each guess expensive while keeping interactive
/// unlock latency acceptable.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Application-wide KDF salt. Identical on every installation.
const KDF_SALT: &[u8] = b"notesafe-static-salt-v1";

/// Length of derived key in bytes (32 bytes = 256 bits for AES-256).
pub const KEY_LENGTH: usize = 32;

/// SHA-256 digest of a PIN, used only for verification.
#[derive(Clone, PartialEq, Eq)]
pub struct PinHash([u8; 32]);

impl PinHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse the hex form stored in the vault.
    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = hex::decode(value.trim())
            .map_err(|e| StoreError::Corrupt(format!("Invalid verification hash: {}", e)))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| StoreError::Corrupt("Verification hash must be 32 bytes".to_string()))?;
        Ok(Self(array))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for PinHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PinHash").field(&"[REDACTED]").finish()
    }
}

/// Symmetric key for an unlocked session.
///
/// Key bytes are zeroized when the value is dropped, which is how a lock
/// discards the key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; KEY_LENGTH],
}

impl SessionKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value. Use only for immediate encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Compute the verification hash of a PIN.
pub fn hash_pin(pin: &str) -> PinHash {
    let digest = Sha256::digest(pin.as_bytes());
    PinHash(digest.into())
}

/// Compare a PIN against a stored hash in constant time.
pub fn verify_pin_hash(pin: &str, expected: &PinHash) -> bool {
    let candidate = hash_pin(pin);
    candidate.0[..].ct_eq(&expected.0[..]).into()
}

/// Derive the session key from a PIN.
///
/// Same PIN always produces the same key, which is what keeps notes written
/// in earlier sessions decryptable.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivation` for an empty PIN.
pub fn derive_key(pin: &str) -> Result<SessionKey> {
    if pin.is_empty() {
        return Err(CryptoError::KeyDerivation("PIN cannot be empty".to_string()).into());
    }

    let mut output = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), KDF_SALT, PBKDF2_ITERATIONS, &mut output);
    let key = SessionKey::from_bytes(output);
    output.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_pin_is_sha256() {
        let hash = hash_pin("1234");
        assert_eq!(
            hash.to_hex(),
            "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
        );
    }

    #[test]
    fn test_pin_hash_hex_round_trip() {
        let hash = hash_pin("0000");
        let parsed = PinHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn test_pin_hash_rejects_bad_hex() {
        assert!(PinHash::from_hex("not-hex").is_err());
        assert!(PinHash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_verify_pin_hash() {
        let stored = hash_pin("4821");
        assert!(verify_pin_hash("4821", &stored));
        assert!(!verify_pin_hash("4822", &stored));
    }

    #[test]
    fn test_derive_key_deterministic() {
        let key1 = derive_key("1234").unwrap();
        let key2 = derive_key("1234").unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_pins_produce_different_keys() {
        let key1 = derive_key("1234").unwrap();
        let key2 = derive_key("1235").unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_key_is_independent_of_verification_hash() {
        let key = derive_key("1234").unwrap();
        let hash = hash_pin("1234");
        assert_ne!(key.as_bytes(), hash.as_bytes());
    }

    #[test]
    fn test_empty_pin_rejected() {
        let err = derive_key("").unwrap_err();
        assert!(err.to_string().contains("PIN cannot be empty"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let key = derive_key("1234").unwrap();
        let debug_output = format!("{:?} {:?}", key, hash_pin("1234"));
        assert!(debug_output.contains("REDACTED"));

        let key_hex = hex::encode(&key.as_bytes()[..4]);
        assert!(!debug_output.contains(&key_hex));
    }
}
