//! Remote-first store with a local fallback.
//!
//! Records are read from and written to the remote document when it is
//! reachable; when a remote operation fails with an infrastructure fault the
//! same operation runs against the local side instead, and the result is
//! marked degraded so callers can tell the user which copy they touched.
//! Business rejections (duplicate email) are never retried locally.
//!
//! Sessions and the activity log are device-local concerns and always go
//! straight to the local side.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::store::{
    ActivityLog, DeviceStore, RecordSet, RecordStore, SessionStore, WriteReceipt,
};
use crate::types::{ActivityEntry, Session, UserRecord};

/// Whether an error is an infrastructure fault that justifies retrying the
/// operation on the local side.
fn is_fallback_worthy(err: &crate::Error) -> bool {
    matches!(err, crate::Error::Store(e) if e.is_unavailable())
}

/// Record store that prefers the remote document and falls back to a local
/// store when the remote is unreachable.
pub struct HybridStore {
    remote: Arc<dyn RecordStore>,
    local: Arc<dyn DeviceStore>,
}

impl HybridStore {
    /// Pair a remote record store with a device-local fallback.
    pub fn new(remote: Arc<dyn RecordStore>, local: Arc<dyn DeviceStore>) -> Self {
        Self { remote, local }
    }

    /// The device-local side.
    pub fn local(&self) -> &Arc<dyn DeviceStore> {
        &self.local
    }

    /// The remote side.
    pub fn remote(&self) -> &Arc<dyn RecordStore> {
        &self.remote
    }
}

#[async_trait]
impl RecordStore for HybridStore {
    async fn get_all(&self) -> Result<RecordSet> {
        match self.remote.get_all().await {
            Ok(set) => Ok(set),
            Err(err) if is_fallback_worthy(&err) => {
                tracing::warn!(error = %err, "Remote read failed, serving local records");
                let mut set = self.local.get_all().await?;
                set.degraded = true;
                Ok(set)
            }
            Err(err) => Err(err),
        }
    }

    async fn save_all(&self, records: &[UserRecord]) -> Result<WriteReceipt> {
        match self.remote.save_all(records).await {
            Ok(receipt) => {
                // Mirror the accepted write so the fallback copy stays fresh.
                // Best effort: a local mirror failure does not fail the write.
                if let Err(err) = self.local.save_all(records).await {
                    tracing::warn!(error = %err, "Failed to mirror records locally");
                }
                Ok(receipt)
            }
            Err(err) if is_fallback_worthy(&err) => {
                tracing::warn!(error = %err, "Remote write failed, writing local records");
                self.local.save_all(records).await?;
                Ok(WriteReceipt { degraded: true })
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl SessionStore for HybridStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        self.local.get_session(session_id).await
    }

    async fn put_session(&self, session: &Session) -> Result<()> {
        self.local.put_session(session).await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.local.sweep_expired(now).await
    }
}

#[async_trait]
impl ActivityLog for HybridStore {
    async fn record(&self, entry: &ActivityEntry) -> Result<()> {
        self.local.record(entry).await
    }

    async fn recent(&self, user_id: &str, limit: u32) -> Result<Vec<ActivityEntry>> {
        self.local.recent(user_id, limit).await
    }
}
