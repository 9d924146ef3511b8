//! PIN validation.
//!
//! PINs are fixed-length numeric codes.

use crate::error::AuthError;

/// Number of digits in a PIN.
pub const PIN_LENGTH: usize = 4;

/// Validate that a PIN is exactly `PIN_LENGTH` ASCII digits.
///
/// # Examples
///
/// ```
/// use notesafe_core::crypto::validate_pin;
///
/// assert!(validate_pin("1234").is_ok());
/// assert!(validate_pin("12a4").is_err());
/// ```
pub fn validate_pin(pin: &str) -> Result<(), AuthError> {
    if pin.len() != PIN_LENGTH {
        return Err(AuthError::InvalidPin(format!(
            "PIN must be exactly {} digits (got {})",
            PIN_LENGTH,
            pin.chars().count()
        )));
    }

    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AuthError::InvalidPin(
            "PIN must contain only digits".to_string(),
        ));
    }

    Ok(())
}
