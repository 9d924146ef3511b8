//! PIN authentication.
//!
//! `AuthController` is the only way into a vault. It checks submitted PINs
//! against the stored verification hash, drives the lockout policy, and
//! hands out the derived session key on success.
//!
//! ```text
//! Uninitialized -> SettingUp -> Unlocked
//! Locked <-> LockedOut
//! Locked -> Unlocked -> Locked
//! Unlocked -> ResettingPin(AwaitingOldPin) -> ResettingPin(AwaitingNewPin) -> Unlocked
//! ```

mod clock;
mod controller;
mod lockout;
mod pin_pad;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{AuthController, PinOutcome};
pub use lockout::{FailureOutcome, LockoutPolicy};
pub use pin_pad::PinPad;

use chrono::{DateTime, Utc};

/// Authentication state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// No PIN has been set (first run)
    Uninitialized,
    /// Collecting the first PIN
    SettingUp,
    /// PIN required
    Locked,
    /// Input refused until the given time
    LockedOut { until: DateTime<Utc> },
    /// Session key held in memory
    Unlocked,
    /// Changing the PIN from an unlocked session
    ResettingPin(ResetStage),
}

/// Step within a PIN reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetStage {
    AwaitingOldPin,
    AwaitingNewPin,
}

impl AuthState {
    /// Short lowercase name, used in messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            AuthState::Uninitialized => "uninitialized",
            AuthState::SettingUp => "setting up",
            AuthState::Locked => "locked",
            AuthState::LockedOut { .. } => "locked out",
            AuthState::Unlocked => "unlocked",
            AuthState::ResettingPin(ResetStage::AwaitingOldPin) => "awaiting current PIN",
            AuthState::ResettingPin(ResetStage::AwaitingNewPin) => "awaiting new PIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(AuthState::Locked.name(), "locked");
        assert_eq!(
            AuthState::ResettingPin(ResetStage::AwaitingNewPin).name(),
            "awaiting new PIN"
        );
    }
}
