//! Lockout policy for brute-force protection
//!
//! Every wrong PIN counts toward `max_attempts`. Reaching it starts a
//! lockout of `duration`, during which no PIN is checked at all. The
//! record is persisted, so neither the count nor the countdown survives a
//! restart by accident.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{NoteSafeError, Result};
use crate::storage::types::LockoutRecord;

/// Highest accepted `max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 20;

/// Longest accepted lockout.
pub const MAX_LOCKOUT_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Lockout policy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lockout
    pub max_attempts: u32,
    /// How long a lockout lasts
    pub duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            duration: Duration::from_secs(30),
        }
    }
}

/// Result of recording a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// More attempts are allowed
    Retry { attempts_remaining: u32 },
    /// The threshold was reached
    LockedOut { until: DateTime<Utc> },
}

impl LockoutPolicy {
    /// Build a policy from user-supplied values.
    ///
    /// `max_attempts` must be within `1..=MAX_ATTEMPTS_LIMIT` and `duration`
    /// non-zero and at most `MAX_LOCKOUT_DURATION`.
    pub fn new(max_attempts: u32, duration: Duration) -> Result<Self> {
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&max_attempts) {
            return Err(NoteSafeError::InvalidInput(format!(
                "max_attempts must be between 1 and {}, got {}",
                MAX_ATTEMPTS_LIMIT, max_attempts
            )));
        }
        if duration.is_zero() || duration > MAX_LOCKOUT_DURATION {
            return Err(NoteSafeError::InvalidInput(format!(
                "lockout duration must be between 1ms and {}s, got {}s",
                MAX_LOCKOUT_DURATION.as_secs(),
                duration.as_secs()
            )));
        }
        Ok(Self {
            max_attempts,
            duration,
        })
    }

    /// Record a failed attempt at `now`.
    pub fn register_failure(&self, record: &mut LockoutRecord, now: DateTime<Utc>) -> FailureOutcome {
        record.failed_attempts = record.failed_attempts.saturating_add(1);

        if record.failed_attempts >= self.max_attempts {
            // Out-of-range durations lock out for as long as time can be represented
            let until = chrono::Duration::from_std(self.duration)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            record.lockout_until = Some(until);
            FailureOutcome::LockedOut { until }
        } else {
            FailureOutcome::Retry {
                attempts_remaining: self.attempts_remaining(record),
            }
        }
    }

    /// Reset after a successful PIN check or an expired lockout.
    pub fn clear(&self, record: &mut LockoutRecord) {
        *record = LockoutRecord::default();
    }

    pub fn attempts_remaining(&self, record: &LockoutRecord) -> u32 {
        self.max_attempts.saturating_sub(record.failed_attempts)
    }

    /// Time left on an active lockout, `None` when input is allowed.
    pub fn remaining(&self, record: &LockoutRecord, now: DateTime<Utc>) -> Option<Duration> {
        let until = record.lockout_until?;
        if now >= until {
            return None;
        }
        (until - now).to_std().ok()
    }

    /// Whether a lockout was set and has now run out.
    pub fn is_expired(&self, record: &LockoutRecord, now: DateTime<Utc>) -> bool {
        matches!(record.lockout_until, Some(until) if now >= until)
    }
}
