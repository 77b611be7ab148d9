//! Login-attempt throttling policy
//!
//! A pure decision layer over [`UserRecord`]: five consecutive failures lock
//! the account for fifteen minutes, a success resets the counters. The policy
//! itself is stateless and side-effect-free; the account service applies the
//! mutation helpers and persists the result.

use chrono::{DateTime, Duration, Utc};

use crate::types::UserRecord;

/// Failed attempts allowed before the account locks.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// How long a lockout lasts.
pub const LOCKOUT_MINUTES: i64 = 15;

/// Whether an authentication attempt may proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockoutDecision {
    /// The attempt may proceed to the digest comparison.
    Allowed,
    /// The account is locked; refuse regardless of password correctness.
    Locked { until: DateTime<Utc> },
}

/// Evaluate the policy for a record at the given instant.
///
/// Locked only while `locked_until` is strictly in the future. An elapsed
/// lockout allows the attempt; the stale counters are cleared on the next
/// success.
pub fn evaluate(record: &UserRecord, now: DateTime<Utc>) -> LockoutDecision {
    match record.locked_until {
        Some(until) if until > now => LockoutDecision::Locked { until },
        _ => LockoutDecision::Allowed,
    }
}

/// Bookkeeping for a failed digest comparison: bump the counter and lock the
/// account once the limit is reached.
pub fn note_failure(record: &mut UserRecord, now: DateTime<Utc>) {
    record.login_attempts += 1;
    if record.login_attempts >= MAX_LOGIN_ATTEMPTS {
        record.locked_until = Some(now + Duration::minutes(LOCKOUT_MINUTES));
    }
}

/// Bookkeeping for a successful authentication: reset the counters and stamp
/// the login time.
pub fn note_success(record: &mut UserRecord, now: DateTime<Utc>) {
    record.login_attempts = 0;
    record.locked_until = None;
    record.last_login = Some(now);
}

/// Attempts left before the account locks.
pub fn attempts_remaining(record: &UserRecord) -> u32 {
    MAX_LOGIN_ATTEMPTS.saturating_sub(record.login_attempts)
}
