//! Fixed-length PIN entry buffer.
//!
//! Collects digits one at a time and hands back the full PIN as soon as the
//! buffer reaches `PIN_LENGTH`, at which point it empties itself.

use zeroize::Zeroizing;

use crate::crypto::PIN_LENGTH;
use crate::error::AuthError;

/// Digit buffer for PIN entry.
#[derive(Default)]
pub struct PinPad {
    digits: Zeroizing<String>,
}

impl PinPad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one digit. Returns the completed PIN when the buffer fills up.
    pub fn push(&mut self, digit: char) -> Result<Option<Zeroizing<String>>, AuthError> {
        if !digit.is_ascii_digit() {
            return Err(AuthError::InvalidPin(
                "PIN must contain only digits".to_string(),
            ));
        }

        self.digits.push(digit);
        if self.digits.len() == PIN_LENGTH {
            let pin = std::mem::take(&mut self.digits);
            return Ok(Some(pin));
        }
        Ok(None)
    }

    /// Feed a run of characters, stopping at the first completed PIN.
    ///
    /// Whitespace is skipped. Characters after a completed PIN are ignored.
    pub fn feed(&mut self, input: &str) -> Result<Option<Zeroizing<String>>, AuthError> {
        for c in input.chars().filter(|c| !c.is_whitespace()) {
            if let Some(pin) = self.push(c)? {
                return Ok(Some(pin));
            }
        }
        Ok(None)
    }

    pub fn backspace(&mut self) {
        self.digits.pop();
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Masked view of the buffer, one bullet per entered digit.
    pub fn masked(&self) -> String {
        let filled = "•".repeat(self.digits.len());
        let empty = "○".repeat(PIN_LENGTH - self.digits.len());
        format!("{}{}", filled, empty)
    }
}

impl std::fmt::Debug for PinPad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinPad")
            .field("len", &self.digits.len())
            .finish()
    }
}
