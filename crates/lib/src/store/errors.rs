//! Storage error types
//!
//! Structured errors for the record store backends. Business-rule violations
//! (duplicate email) are distinguished from infrastructure faults so the
//! hybrid store knows which failures justify falling back.

use thiserror::Error;

/// Errors that can occur during store operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The email uniqueness constraint was violated.
    ///
    /// Surfaced distinctly from other write failures so callers can report
    /// it as a business outcome rather than a fault.
    #[error("Email already exists: {email}")]
    DuplicateEmail {
        /// The normalized email that collided
        email: String,
    },

    /// The local database rejected or failed an operation.
    #[error("Local database error: {reason}")]
    Sqlx {
        /// Context for the failure
        reason: String,
        /// The underlying sqlx error, when one exists
        #[source]
        source: Option<sqlx::Error>,
    },

    /// The remote document API could not be reached.
    #[error("Remote request failed: {reason}")]
    Http {
        /// Context for the failure
        reason: String,
        /// The underlying client error, when one exists
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The remote document API answered with a non-success status.
    #[error("Remote returned status {status}")]
    RemoteStatus {
        /// The HTTP status code
        status: u16,
    },

    /// The remote payload did not match the expected document shape.
    #[error("Malformed remote payload: {reason}")]
    InvalidPayload {
        /// What failed to parse
        reason: String,
    },

    /// File I/O failed for a file-persisted store.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serializing or deserializing persisted state failed.
    #[error("Serialization failed")]
    Serialization {
        /// The underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Check if this error indicates an email uniqueness violation.
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, StoreError::DuplicateEmail { .. })
    }

    /// Check if this error is an infrastructure fault (network, database,
    /// malformed payload). These are the failures that justify falling back
    /// to another backend.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlx { .. }
                | StoreError::Http { .. }
                | StoreError::RemoteStatus { .. }
                | StoreError::InvalidPayload { .. }
                | StoreError::FileIo { .. }
                | StoreError::Serialization { .. }
        )
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
