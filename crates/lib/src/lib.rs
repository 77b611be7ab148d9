//!
//! Gymdex: the account system behind the Gymdex gym-directory demo.
//! This library provides registration, authentication, session handling,
//! and opportunistic cloud reconciliation of user records.
//!
//! ## Core Concepts
//!
//! * **UserRecord (`types::UserRecord`)**: A single member account, keyed by
//!   normalized (lowercase) email within a store.
//! * **Record Stores (`store::RecordStore`)**: A pluggable storage layer for
//!   the user record set, with local (SQLite), remote (JSON-document API),
//!   hybrid (remote-preferring with local fallback), and in-memory variants.
//! * **AccountService (`account::AccountService`)**: The single entry point
//!   for register / authenticate / change-password / delete / list. It owns
//!   the lockout bookkeeping and maps storage faults to structured errors.
//! * **SessionManager (`session::SessionManager`)**: Issues, validates, and
//!   revokes 24-hour session tokens tied to a user id.
//! * **SyncCoordinator (`sync::SyncCoordinator`)**: One-way reconciliation
//!   that makes locally registered accounts visible in the remote store.
//!
//! All timestamps and time-derived ids flow through an injected
//! [`Clock`](clock::Clock), so tests can control time.

pub mod account;
pub mod cache;
pub mod clock;
pub mod crypto;
pub mod lockout;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;

pub use account::AccountService;
pub use cache::ClientCache;
pub use clock::{Clock, SystemClock};
pub use crypto::CredentialHasher;
pub use session::SessionManager;
pub use sync::SyncCoordinator;
pub use types::{MembershipType, Session, UserRecord, UserSummary};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Result type used throughout the Gymdex library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Gymdex library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured account errors from the account module
    #[error(transparent)]
    Account(account::AccountError),

    /// Structured storage errors from the store module
    ///
    /// I/O and serialization failures arrive here too, wrapped as
    /// [`store::StoreError::FileIo`] / [`store::StoreError::Serialization`]
    /// by the backend that hit them.
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Account(_) => "account",
            Error::Store(_) => "store",
        }
    }

    /// Check if this error indicates a user or record was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Account(account::AccountError::UserNotFound { .. })
        )
    }

    /// Check if this error indicates an email is already registered.
    pub fn is_duplicate_email(&self) -> bool {
        match self {
            Error::Account(err) => err.is_duplicate_email(),
            Error::Store(err) => err.is_duplicate_email(),
        }
    }

    /// Check if this error indicates a temporarily locked account.
    pub fn is_locked_out(&self) -> bool {
        matches!(
            self,
            Error::Account(account::AccountError::AccountLocked { .. })
        )
    }

    /// The lockout deadline, if this error is a lockout rejection.
    pub fn locked_until(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        match self {
            Error::Account(account::AccountError::AccountLocked { until }) => Some(*until),
            _ => None,
        }
    }

    /// Check if this error indicates a wrong password.
    pub fn is_bad_credentials(&self) -> bool {
        matches!(
            self,
            Error::Account(
                account::AccountError::BadCredentials { .. }
                    | account::AccountError::BadCurrentPassword
            )
        )
    }

    /// Remaining attempts before lockout, if this error is a wrong-password
    /// rejection.
    pub fn attempts_remaining(&self) -> Option<u32> {
        match self {
            Error::Account(account::AccountError::BadCredentials { attempts_remaining }) => {
                Some(*attempts_remaining)
            }
            _ => None,
        }
    }

    /// Check if this error indicates malformed caller input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Error::Account(account::AccountError::InvalidInput { .. })
        )
    }

    /// Check if this error indicates a storage or network fault.
    pub fn is_backend_unavailable(&self) -> bool {
        match self {
            Error::Account(account::AccountError::BackendUnavailable { .. }) => true,
            Error::Store(err) => err.is_unavailable(),
            _ => false,
        }
    }
}
