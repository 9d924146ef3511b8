//! Authenticated encryption of note bodies.
//!
//! Uses AES-256-GCM. Key size: 32 bytes. Nonce: 12 bytes (random per call).
//! Tag: 16 bytes, appended to the ciphertext.
//!
//! The nonce is returned separately and stored next to the ciphertext as
//! the note's envelope.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::crypto::key::SessionKey;
use crate::error::CryptoError;

/// Nonce length for AES-256-GCM.
pub const NONCE_LENGTH: usize = 12;

/// Stored unit of one encrypted note body.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("nonce", &"[REDACTED]")
            .finish()
    }
}

/// Encrypt `plaintext` under `key` with a freshly generated nonce.
pub fn encrypt(key: &SessionKey, plaintext: &[u8]) -> Result<Envelope, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(Envelope {
        ciphertext,
        nonce: nonce.to_vec(),
    })
}

/// Decrypt an envelope.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` when the tag does not verify,
/// which is the normal result of using the wrong key.
pub fn decrypt(key: &SessionKey, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if envelope.nonce.len() != NONCE_LENGTH {
        return Err(CryptoError::InvalidNonce {
            expected: NONCE_LENGTH,
            actual: envelope.nonce.len(),
        });
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::DecryptionFailed)?;
    let nonce = Nonce::from_slice(&envelope.nonce);

    let plaintext = cipher
        .decrypt(nonce, envelope.ciphertext.as_slice())
        .map_err(|_| CryptoError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SessionKey {
        SessionKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_round_trip() {
        let k = key(7);
        let envelope = encrypt(&k, b"draft").unwrap();
        assert_ne!(envelope.ciphertext.as_slice(), b"draft");
        assert_eq!(envelope.nonce.len(), NONCE_LENGTH);

        let plaintext = decrypt(&k, &envelope).unwrap();
        assert_eq!(plaintext.as_slice(), b"draft");
    }

    #[test]
    fn test_wrong_key_fails() {
        let envelope = encrypt(&key(1), b"secret").unwrap();
        let err = decrypt(&key(2), &envelope).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn test_nonce_unique_per_call() {
        let k = key(3);
        let a = encrypt(&k, b"same text").unwrap();
        let b = encrypt(&k, b"same text").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let k = key(4);
        let mut envelope = encrypt(&k, b"untouched").unwrap();
        envelope.ciphertext[0] ^= 0x01;
        assert!(matches!(
            decrypt(&k, &envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_bad_nonce_length_rejected() {
        let k = key(5);
        let mut envelope = encrypt(&k, b"x").unwrap();
        envelope.nonce.truncate(8);
        assert!(matches!(
            decrypt(&k, &envelope),
            Err(CryptoError::InvalidNonce {
                expected: 12,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let k = key(6);
        let envelope = encrypt(&k, b"").unwrap();
        assert!(decrypt(&k, &envelope).unwrap().is_empty());
    }

    #[test]
    fn test_debug_hides_nonce() {
        let envelope = encrypt(&key(8), b"x").unwrap();
        let debug_output = format!("{:?}", envelope);
        assert!(debug_output.contains("REDACTED"));
    }
}
