//! In-memory store with optional JSON file persistence.
//!
//! Holds everything in process memory behind async locks. Useful as a test
//! double for the trait consumers and as a zero-setup backend; `save_to_file`
//! and `load_from_file` give it crash-survivable persistence when a path is
//! worth the trouble.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::store::errors::StoreError;
use crate::store::{ActivityLog, RecordSet, RecordStore, SessionStore, WriteReceipt};
use crate::types::{ActivityEntry, Session, UserRecord, normalize_email};

/// Serializable snapshot of the whole store, for file persistence.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    users: Vec<UserRecord>,
    sessions: HashMap<String, Session>,
    activity: Vec<ActivityEntry>,
}

/// In-memory backend implementing all three storage traits.
#[derive(Debug, Default)]
pub struct InMemory {
    users: RwLock<Vec<UserRecord>>,
    sessions: RwLock<HashMap<String, Session>>,
    activity: RwLock<Vec<ActivityEntry>>,
}

impl InMemory {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON file written by [`save_to_file`].
    ///
    /// A missing file yields an empty store; a file that exists but cannot be
    /// read or parsed is an error.
    ///
    /// [`save_to_file`]: InMemory::save_to_file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = match tokio::fs::read_to_string(path.as_ref()).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new());
            }
            Err(e) => return Err(StoreError::FileIo { source: e }.into()),
        };
        let state: PersistedState =
            serde_json::from_str(&contents).map_err(|e| StoreError::Serialization { source: e })?;

        Ok(Self {
            users: RwLock::new(state.users),
            sessions: RwLock::new(state.sessions),
            activity: RwLock::new(state.activity),
        })
    }

    /// Write the current state to a JSON file.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let state = PersistedState {
            users: self.users.read().await.clone(),
            sessions: self.sessions.read().await.clone(),
            activity: self.activity.read().await.clone(),
        };

        let contents = serde_json::to_string_pretty(&state)
            .map_err(|e| StoreError::Serialization { source: e })?;
        tokio::fs::write(path.as_ref(), contents)
            .await
            .map_err(|e| StoreError::FileIo { source: e })?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemory {
    async fn get_all(&self) -> Result<RecordSet> {
        Ok(RecordSet {
            records: self.users.read().await.clone(),
            degraded: false,
        })
    }

    async fn save_all(&self, records: &[UserRecord]) -> Result<WriteReceipt> {
        // Enforce the unique-email invariant the same way the indexed
        // backend does.
        let mut seen = HashSet::new();
        for record in records {
            if !seen.insert(normalize_email(&record.email)) {
                return Err(StoreError::DuplicateEmail {
                    email: record.email.clone(),
                }
                .into());
            }
        }

        *self.users.write().await = records.to_vec();
        Ok(WriteReceipt { degraded: false })
    }
}

#[async_trait]
impl SessionStore for InMemory {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn put_session(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        // Strictly past, matching the lazy expiry check: a session still
        // valid at this exact instant is not swept.
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl ActivityLog for InMemory {
    async fn record(&self, entry: &ActivityEntry) -> Result<()> {
        self.activity.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, user_id: &str, limit: u32) -> Result<Vec<ActivityEntry>> {
        let activity = self.activity.read().await;
        let mut entries: Vec<ActivityEntry> = activity
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit as usize);
        Ok(entries)
    }
}
