//! PIN setup, verification and reset state machine.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::lockout::{FailureOutcome, LockoutPolicy};
use super::{AuthState, ResetStage};
use crate::crypto::{derive_key, hash_pin, validate_pin, verify_pin_hash, SessionKey};
use crate::error::{AuthError, Result, StoreError};
use crate::storage::traits::SecretStore;
use crate::storage::types::{LockoutRecord, PinRecord};

/// Result of submitting a PIN.
///
/// Rejections are values, not errors: the caller shows the message and
/// stays on the PIN screen. `Err` from [`AuthController::submit_pin`] means
/// the store or the KDF failed.
#[derive(Debug)]
pub enum PinOutcome {
    /// PIN accepted; the session can start with this key
    Unlocked(SessionKey),
    /// Current PIN confirmed during a reset; a new PIN is expected next
    ResetVerified,
    /// New PIN accepted during a reset. Nothing is persisted yet: the caller
    /// commits the record (re-encrypting notes) and then calls
    /// [`AuthController::complete_pin_reset`].
    NewPin { record: PinRecord, key: SessionKey },
    /// PIN refused; state reflects any lockout
    Rejected(AuthError),
}

/// Authentication state machine.
pub struct AuthController<C: Clock = SystemClock> {
    state: AuthState,
    policy: LockoutPolicy,
    lockout: LockoutRecord,
    clock: C,
}

impl AuthController<SystemClock> {
    pub fn load<S: SecretStore>(store: &mut S, policy: LockoutPolicy) -> Result<Self> {
        Self::load_with_clock(store, policy, SystemClock)
    }
}

impl<C: Clock> AuthController<C> {
    /// Build the controller from persisted state.
    ///
    /// A lockout recorded before a restart is still enforced; one that ran
    /// out while the process was down is cleared here.
    pub fn load_with_clock<S: SecretStore>(
        store: &mut S,
        policy: LockoutPolicy,
        clock: C,
    ) -> Result<Self> {
        let lockout = store.load_lockout()?;
        let state = if store.load_pin_record()?.is_some() {
            AuthState::Locked
        } else {
            AuthState::Uninitialized
        };

        let mut controller = Self {
            state,
            policy,
            lockout,
            clock,
        };

        if controller.state == AuthState::Locked {
            if let Some(until) = controller.lockout.lockout_until {
                controller.state = AuthState::LockedOut { until };
            }
            controller.refresh(store)?;
        }

        debug!(state = controller.state.name(), "Loaded auth state");
        Ok(controller)
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Current time according to the controller's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == AuthState::Unlocked
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.policy.attempts_remaining(&self.lockout)
    }

    /// Time left on an active lockout, for countdown display.
    pub fn lockout_remaining(&self) -> Option<Duration> {
        match self.state {
            AuthState::LockedOut { .. } => self.policy.remaining(&self.lockout, self.clock.now()),
            _ => None,
        }
    }

    /// End an expired lockout. Called from the countdown timer and before
    /// every PIN check.
    pub fn refresh<S: SecretStore>(&mut self, store: &mut S) -> Result<()> {
        if let AuthState::LockedOut { .. } = self.state {
            if self.policy.is_expired(&self.lockout, self.clock.now()) {
                self.policy.clear(&mut self.lockout);
                store.save_lockout(&self.lockout)?;
                self.state = AuthState::Locked;
                info!("Lockout expired");
            }
        }
        Ok(())
    }

    /// Start collecting the first PIN.
    pub fn begin_setup(&mut self) -> std::result::Result<(), AuthError> {
        match self.state {
            AuthState::Uninitialized => {
                self.state = AuthState::SettingUp;
                Ok(())
            }
            AuthState::SettingUp => Ok(()),
            _ => Err(self.invalid("set up a PIN")),
        }
    }

    /// Submit a complete PIN in the current state.
    pub fn submit_pin<S: SecretStore>(&mut self, store: &mut S, pin: &str) -> Result<PinOutcome> {
        self.refresh(store)?;

        if let AuthState::LockedOut { .. } = self.state {
            return Ok(PinOutcome::Rejected(self.locked_out_error()));
        }

        if let Err(e) = validate_pin(pin) {
            return Ok(PinOutcome::Rejected(e));
        }

        match self.state {
            AuthState::Uninitialized | AuthState::SettingUp => self.set_up(store, pin),
            AuthState::Locked => self.unlock(store, pin),
            AuthState::ResettingPin(ResetStage::AwaitingOldPin) => self.verify_for_reset(store, pin),
            AuthState::ResettingPin(ResetStage::AwaitingNewPin) => {
                let record = PinRecord {
                    verification_hash: hash_pin(pin),
                };
                let key = derive_key(pin)?;
                Ok(PinOutcome::NewPin { record, key })
            }
            AuthState::Unlocked | AuthState::LockedOut { .. } => {
                Ok(PinOutcome::Rejected(self.invalid("submit a PIN")))
            }
        }
    }

    fn set_up<S: SecretStore>(&mut self, store: &mut S, pin: &str) -> Result<PinOutcome> {
        let record = PinRecord {
            verification_hash: hash_pin(pin),
        };
        let key = derive_key(pin)?;

        store.set_up_pin(&record)?;
        self.policy.clear(&mut self.lockout);

        self.state = AuthState::Unlocked;
        info!("PIN set up");
        Ok(PinOutcome::Unlocked(key))
    }

    fn unlock<S: SecretStore>(&mut self, store: &mut S, pin: &str) -> Result<PinOutcome> {
        let record = stored_record(store)?;

        if !verify_pin_hash(pin, &record.verification_hash) {
            return self.fail(store, false);
        }

        let key = derive_key(pin)?;
        if !self.lockout.is_clear() {
            self.policy.clear(&mut self.lockout);
            store.save_lockout(&self.lockout)?;
        }

        self.state = AuthState::Unlocked;
        info!("Vault unlocked");
        Ok(PinOutcome::Unlocked(key))
    }

    fn verify_for_reset<S: SecretStore>(&mut self, store: &mut S, pin: &str) -> Result<PinOutcome> {
        let record = stored_record(store)?;

        if !verify_pin_hash(pin, &record.verification_hash) {
            return self.fail(store, true);
        }

        if !self.lockout.is_clear() {
            self.policy.clear(&mut self.lockout);
            store.save_lockout(&self.lockout)?;
        }

        self.state = AuthState::ResettingPin(ResetStage::AwaitingNewPin);
        debug!("Current PIN confirmed for reset");
        Ok(PinOutcome::ResetVerified)
    }

    fn fail<S: SecretStore>(&mut self, store: &mut S, during_reset: bool) -> Result<PinOutcome> {
        let outcome = self.policy.register_failure(&mut self.lockout, self.clock.now());
        store.save_lockout(&self.lockout)?;

        match outcome {
            FailureOutcome::Retry { attempts_remaining } => {
                warn!(attempts_remaining, "Wrong PIN");
                let error = if during_reset {
                    AuthError::ResetVerificationFailed { attempts_remaining }
                } else {
                    AuthError::WrongPin { attempts_remaining }
                };
                Ok(PinOutcome::Rejected(error))
            }
            FailureOutcome::LockedOut { until } => {
                warn!(
                    failed_attempts = self.lockout.failed_attempts,
                    "Too many wrong PINs, locking out"
                );
                self.state = AuthState::LockedOut { until };
                Ok(PinOutcome::Rejected(self.locked_out_error()))
            }
        }
    }

    /// Drop back to `Locked`. The caller discards the session key.
    pub fn lock(&mut self) -> std::result::Result<(), AuthError> {
        match self.state {
            AuthState::Unlocked | AuthState::ResettingPin(_) => {
                self.state = AuthState::Locked;
                info!("Vault locked");
                Ok(())
            }
            AuthState::Locked | AuthState::LockedOut { .. } => Ok(()),
            _ => Err(self.invalid("lock")),
        }
    }

    pub fn begin_pin_reset(&mut self) -> std::result::Result<(), AuthError> {
        match self.state {
            AuthState::Unlocked => {
                self.state = AuthState::ResettingPin(ResetStage::AwaitingOldPin);
                debug!("PIN reset started");
                Ok(())
            }
            _ => Err(self.invalid("change the PIN")),
        }
    }

    pub fn cancel_pin_reset(&mut self) -> std::result::Result<(), AuthError> {
        match self.state {
            AuthState::ResettingPin(_) => {
                self.state = AuthState::Unlocked;
                debug!("PIN reset cancelled");
                Ok(())
            }
            _ => Err(self.invalid("cancel a PIN reset")),
        }
    }

    /// Finish a reset once the new record has been committed.
    pub fn complete_pin_reset(&mut self) -> std::result::Result<(), AuthError> {
        match self.state {
            AuthState::ResettingPin(ResetStage::AwaitingNewPin) => {
                self.policy.clear(&mut self.lockout);
                self.state = AuthState::Unlocked;
                info!("PIN changed");
                Ok(())
            }
            _ => Err(self.invalid("complete a PIN reset")),
        }
    }

    /// Erase the vault and return to first-run state.
    pub fn factory_reset<S: SecretStore>(&mut self, store: &mut S) -> Result<()> {
        store.wipe()?;
        self.policy.clear(&mut self.lockout);
        self.state = AuthState::Uninitialized;
        warn!("Vault wiped");
        Ok(())
    }

    fn locked_out_error(&self) -> AuthError {
        AuthError::LockedOut {
            remaining: self
                .policy
                .remaining(&self.lockout, self.clock.now())
                .unwrap_or_default(),
        }
    }

    fn invalid(&self, action: &'static str) -> AuthError {
        AuthError::InvalidState {
            action,
            state: self.state.name(),
        }
    }
}

fn stored_record<S: SecretStore>(store: &S) -> Result<PinRecord> {
    store
        .load_pin_record()?
        .ok_or_else(|| StoreError::Corrupt("PIN record missing".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ManualClock;
    use crate::storage::SqliteStore;

    fn controller(store: &mut SqliteStore, clock: &ManualClock) -> AuthController<ManualClock> {
        AuthController::load_with_clock(store, LockoutPolicy::default(), clock.clone()).unwrap()
    }

    fn set_up(store: &mut SqliteStore, clock: &ManualClock, pin: &str) -> AuthController<ManualClock> {
        let mut auth = controller(store, clock);
        assert!(matches!(
            auth.submit_pin(store, pin).unwrap(),
            PinOutcome::Unlocked(_)
        ));
        auth.lock().unwrap();
        auth
    }

    #[test]
    fn test_fresh_vault_is_uninitialized() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut auth = controller(&mut store, &ManualClock::default());
        assert_eq!(auth.state(), &AuthState::Uninitialized);
        auth.begin_setup().unwrap();
        assert_eq!(auth.state(), &AuthState::SettingUp);
    }

    #[test]
    fn test_setup_persists_hash_and_unlocks() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut auth = controller(&mut store, &ManualClock::default());

        let outcome = auth.submit_pin(&mut store, "1234").unwrap();
        assert!(matches!(outcome, PinOutcome::Unlocked(_)));
        assert!(auth.is_unlocked());

        let record = store.load_pin_record().unwrap().unwrap();
        assert_eq!(record.verification_hash, hash_pin("1234"));
    }

    #[test]
    fn test_unlock_yields_same_key() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let clock = ManualClock::default();
        let mut auth = controller(&mut store, &clock);

        let PinOutcome::Unlocked(first) = auth.submit_pin(&mut store, "1234").unwrap() else {
            panic!("expected unlock");
        };
        auth.lock().unwrap();
        assert_eq!(auth.state(), &AuthState::Locked);

        let PinOutcome::Unlocked(second) = auth.submit_pin(&mut store, "1234").unwrap() else {
            panic!("expected unlock");
        };
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_malformed_pin_not_counted() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let clock = ManualClock::default();
        let mut auth = set_up(&mut store, &clock, "1234");

        let outcome = auth.submit_pin(&mut store, "12").unwrap();
        assert!(matches!(
            outcome,
            PinOutcome::Rejected(AuthError::InvalidPin(_))
        ));
        assert_eq!(auth.attempts_remaining(), 5);
    }

    #[test]
    fn test_wrong_pins_lead_to_lockout() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let clock = ManualClock::default();
        let mut auth = set_up(&mut store, &clock, "1234");

        for remaining in (1..=4).rev() {
            let outcome = auth.submit_pin(&mut store, "0000").unwrap();
            match outcome {
                PinOutcome::Rejected(AuthError::WrongPin { attempts_remaining }) => {
                    assert_eq!(attempts_remaining, remaining)
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        let outcome = auth.submit_pin(&mut store, "0000").unwrap();
        assert!(matches!(
            outcome,
            PinOutcome::Rejected(AuthError::LockedOut { .. })
        ));
        assert!(matches!(auth.state(), AuthState::LockedOut { .. }));
        assert_eq!(auth.lockout_remaining(), Some(Duration::from_secs(30)));

        // Correct PIN is refused while locked out and does not extend it.
        let outcome = auth.submit_pin(&mut store, "1234").unwrap();
        assert!(matches!(
            outcome,
            PinOutcome::Rejected(AuthError::LockedOut { .. })
        ));

        clock.advance(chrono::Duration::seconds(30));
        let outcome = auth.submit_pin(&mut store, "1234").unwrap();
        assert!(matches!(outcome, PinOutcome::Unlocked(_)));
        assert!(store.load_lockout().unwrap().is_clear());
    }

    #[test]
    fn test_refresh_ends_lockout() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let clock = ManualClock::default();
        let mut auth = set_up(&mut store, &clock, "1234");
        for _ in 0..5 {
            auth.submit_pin(&mut store, "9999").unwrap();
        }

        clock.advance(chrono::Duration::seconds(29));
        auth.refresh(&mut store).unwrap();
        assert!(matches!(auth.state(), AuthState::LockedOut { .. }));

        clock.advance(chrono::Duration::seconds(1));
        auth.refresh(&mut store).unwrap();
        assert_eq!(auth.state(), &AuthState::Locked);
        assert_eq!(auth.lockout_remaining(), None);
        assert_eq!(auth.attempts_remaining(), 5);
    }

    #[test]
    fn test_failed_attempts_survive_reload() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let clock = ManualClock::default();
        let mut auth = set_up(&mut store, &clock, "1234");
        for _ in 0..3 {
            auth.submit_pin(&mut store, "0000").unwrap();
        }
        drop(auth);

        let auth = controller(&mut store, &clock);
        assert_eq!(auth.attempts_remaining(), 2);
    }

    #[test]
    fn test_reset_flow() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut auth = controller(&mut store, &ManualClock::default());
        auth.submit_pin(&mut store, "1234").unwrap();

        auth.begin_pin_reset().unwrap();
        let outcome = auth.submit_pin(&mut store, "1111").unwrap();
        assert!(matches!(
            outcome,
            PinOutcome::Rejected(AuthError::ResetVerificationFailed {
                attempts_remaining: 4
            })
        ));

        let outcome = auth.submit_pin(&mut store, "1234").unwrap();
        assert!(matches!(outcome, PinOutcome::ResetVerified));
        assert_eq!(
            auth.state(),
            &AuthState::ResettingPin(ResetStage::AwaitingNewPin)
        );

        let PinOutcome::NewPin { record, .. } = auth.submit_pin(&mut store, "5678").unwrap() else {
            panic!("expected new PIN");
        };
        assert_eq!(record.verification_hash, hash_pin("5678"));
        // Nothing persisted until the caller commits.
        assert_eq!(
            store.load_pin_record().unwrap().unwrap().verification_hash,
            hash_pin("1234")
        );

        auth.complete_pin_reset().unwrap();
        assert!(auth.is_unlocked());
    }

    #[test]
    fn test_cancel_reset_returns_to_unlocked() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut auth = controller(&mut store, &ManualClock::default());
        auth.submit_pin(&mut store, "1234").unwrap();

        auth.begin_pin_reset().unwrap();
        auth.cancel_pin_reset().unwrap();
        assert!(auth.is_unlocked());
        assert!(auth.cancel_pin_reset().is_err());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut auth = controller(&mut store, &ManualClock::default());

        let err = auth.begin_pin_reset().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot change the PIN while uninitialized"
        );
        assert!(auth.lock().is_err());
        assert!(auth.complete_pin_reset().is_err());

        auth.submit_pin(&mut store, "1234").unwrap();
        let outcome = auth.submit_pin(&mut store, "1234").unwrap();
        assert!(matches!(
            outcome,
            PinOutcome::Rejected(AuthError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_factory_reset_returns_to_uninitialized() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let clock = ManualClock::default();
        let mut auth = set_up(&mut store, &clock, "1234");
        for _ in 0..5 {
            auth.submit_pin(&mut store, "0000").unwrap();
        }

        auth.factory_reset(&mut store).unwrap();
        assert_eq!(auth.state(), &AuthState::Uninitialized);
        assert!(store.load_pin_record().unwrap().is_none());
        assert!(store.load_lockout().unwrap().is_clear());
    }
}
