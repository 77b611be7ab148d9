//! Account error types
//!
//! Business rejections from the account operations. Every variant here is a
//! deliberate refusal with a structured reason; storage and network faults
//! are wrapped in [`AccountError::BackendUnavailable`] at the service
//! boundary so callers distinguish "you were refused" from "the backend is
//! down".

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during account operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AccountError {
    /// Caller input failed validation before any storage was touched.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// The email is already registered.
    #[error("Email already registered: {email}")]
    DuplicateEmail {
        /// The normalized email that collided
        email: String,
    },

    /// No active account exists for this email.
    #[error("No account found for: {email}")]
    UserNotFound {
        /// The normalized email that was looked up
        email: String,
    },

    /// The account is locked after too many failed attempts.
    #[error("Account locked until {until}")]
    AccountLocked {
        /// When the lockout elapses
        until: DateTime<Utc>,
    },

    /// The password did not match.
    #[error("Invalid credentials ({attempts_remaining} attempts remaining)")]
    BadCredentials {
        /// Failed attempts left before the account locks
        attempts_remaining: u32,
    },

    /// The current password given to a password change did not match.
    #[error("Current password is incorrect")]
    BadCurrentPassword,

    /// A storage or network fault prevented the operation.
    #[error("Backend unavailable")]
    BackendUnavailable {
        /// The underlying storage fault
        #[source]
        source: StoreError,
    },
}

impl AccountError {
    /// Check if this error indicates an email is already registered.
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, AccountError::DuplicateEmail { .. })
    }

    /// Check if this error is a business rejection rather than a fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AccountError::BackendUnavailable { .. })
    }
}

impl From<AccountError> for crate::Error {
    fn from(err: AccountError) -> Self {
        crate::Error::Account(err)
    }
}
