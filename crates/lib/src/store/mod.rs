//! Record store implementations
//!
//! This module provides the storage traits and the backend variants that
//! implement them. The account service and session manager are written
//! against the traits so the same logic runs over every backend.
//!
//! The record set is always read and written whole: mutations are
//! `get_all`-then-`save_all` pairs, and each such pair is the unit that must
//! not interleave with another writer. The in-process backends serialize
//! writers internally; the remote backend's whole-document PUT has no
//! optimistic-concurrency check, so concurrent remote writers can lose
//! updates. That race is an accepted limitation of the document API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::types::{ActivityEntry, Session, UserRecord, normalize_email};

pub mod errors;
mod hybrid;
mod local;
mod memory;
mod remote;
pub mod schema;

pub use errors::StoreError;
pub use hybrid::HybridStore;
pub use local::LocalStore;
pub use memory::InMemory;
pub use remote::{RemoteConfig, RemoteStore};

/// A full read of the record set.
#[derive(Clone, Debug, Default)]
pub struct RecordSet {
    /// Every record the backend could produce. Empty is a valid result.
    pub records: Vec<UserRecord>,
    /// True when the read was served by a fallback backend.
    pub degraded: bool,
}

/// Acknowledgement of a full write of the record set.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteReceipt {
    /// True when the write landed on a fallback backend.
    pub degraded: bool,
}

/// Durable keyed storage of user records, unique on normalized email.
///
/// All operations may perform I/O. Implementations must be shareable across
/// tasks; interior synchronization is the implementation's concern.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the entire record set.
    async fn get_all(&self) -> Result<RecordSet>;

    /// Replace the entire record set.
    ///
    /// Atomic from the caller's point of view: no concurrent reader observes
    /// a partial write.
    async fn save_all(&self, records: &[UserRecord]) -> Result<WriteReceipt>;

    /// Whether a record with this email exists. Derived from [`get_all`]
    /// after normalization.
    ///
    /// [`get_all`]: RecordStore::get_all
    async fn exists(&self, email: &str) -> Result<bool> {
        let normalized = normalize_email(email);
        let set = self.get_all().await?;
        Ok(set.records.iter().any(|r| r.email == normalized))
    }
}

/// Device-local storage of session tokens.
///
/// Sessions never leave the device, so the remote record store does not
/// implement this trait; the hybrid store delegates to its local side.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by token.
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    /// Insert or replace a session.
    async fn put_session(&self, session: &Session) -> Result<()>;

    /// Physically delete sessions whose expiry is strictly in the past,
    /// the same boundary the lazy check on validation uses. Storage hygiene
    /// only; a session never outlives its expiry just because no sweep ran.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Append-only per-user activity log.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Append one log row.
    async fn record(&self, entry: &ActivityEntry) -> Result<()>;

    /// The most recent rows for a user, newest first.
    async fn recent(&self, user_id: &str, limit: u32) -> Result<Vec<ActivityEntry>>;
}

/// Everything a device-resident store provides: records, sessions, and the
/// activity log. The hybrid store keeps one of these as its fallback side.
pub trait DeviceStore: RecordStore + SessionStore + ActivityLog {}

impl<T: RecordStore + SessionStore + ActivityLog> DeviceStore for T {}
