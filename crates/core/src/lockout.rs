//! Admin login lockout policy.
//!
//! Failed logins are counted per account. Reaching the limit locks the account
//! for a fixed duration; a successful login resets the counter.

use chrono::{DateTime, Duration, Utc};

/// Default number of failed attempts before an account is locked.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lock duration in minutes.
pub const DEFAULT_LOCK_MINUTES: i64 = 120;

/// Stored login-attempt counters for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoginAttempts {
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Lockout thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lock_duration: Duration::minutes(DEFAULT_LOCK_MINUTES),
        }
    }
}

impl LockoutPolicy {
    /// Whether the account is currently locked.
    #[must_use]
    pub fn is_locked(&self, attempts: &LoginAttempts, now: DateTime<Utc>) -> bool {
        attempts.locked_until.is_some_and(|until| until > now)
    }

    /// Counters after a failed login at `now`.
    ///
    /// A lock that has already expired starts a fresh count.
    #[must_use]
    pub fn record_failure(&self, attempts: &LoginAttempts, now: DateTime<Utc>) -> LoginAttempts {
        let previous = if attempts.locked_until.is_some_and(|until| until <= now) {
            0
        } else {
            attempts.failed_attempts
        };
        let failed_attempts = previous.saturating_add(1);
        let max = i32::try_from(self.max_attempts).unwrap_or(i32::MAX);

        LoginAttempts {
            failed_attempts,
            locked_until: (failed_attempts >= max).then(|| now + self.lock_duration),
        }
    }

    /// Counters after a successful login.
    #[must_use]
    pub const fn record_success(&self) -> LoginAttempts {
        LoginAttempts {
            failed_attempts: 0,
            locked_until: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locks_after_max_attempts() {
        let policy = LockoutPolicy {
            max_attempts: 3,
            lock_duration: Duration::minutes(10),
        };
        let now = Utc::now();

        let mut attempts = LoginAttempts::default();
        for _ in 0..2 {
            attempts = policy.record_failure(&attempts, now);
            assert!(!policy.is_locked(&attempts, now));
        }

        attempts = policy.record_failure(&attempts, now);
        assert_eq!(attempts.failed_attempts, 3);
        assert!(policy.is_locked(&attempts, now));
        assert!(!policy.is_locked(&attempts, now + Duration::minutes(11)));
    }

    #[test]
    fn test_expired_lock_restarts_count() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let attempts = LoginAttempts {
            failed_attempts: 5,
            locked_until: Some(now - Duration::seconds(1)),
        };

        let next = policy.record_failure(&attempts, now);
        assert_eq!(next.failed_attempts, 1);
        assert_eq!(next.locked_until, None);
    }

    #[test]
    fn test_success_resets() {
        let policy = LockoutPolicy::default();
        assert_eq!(policy.record_success(), LoginAttempts::default());
    }
}
