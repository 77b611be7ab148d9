//! Client-side convenience cache.
//!
//! Remembers the current session token and a summary of the last
//! authenticated user so a client can greet the user and resume a session
//! without a backend round trip. Everything here is a convenience copy: the
//! stores remain authoritative, and losing the cache loses nothing but a
//! lookup.
//!
//! When built with a file path the cache persists itself as JSON after every
//! mutation. Persistence is best effort; a write failure is logged and the
//! in-memory copy stays usable.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::types::{MembershipType, UserRecord};

/// Summary of the last user who authenticated on this device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastKnownUser {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub membership_type: MembershipType,
}

impl From<&UserRecord> for LastKnownUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            user_id: record.id.clone(),
            email: record.email.clone(),
            full_name: record.full_name.clone(),
            membership_type: record.membership_type,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheState {
    current_session: Option<String>,
    last_user: Option<LastKnownUser>,
}

/// In-memory cache with optional JSON file persistence.
#[derive(Debug, Default)]
pub struct ClientCache {
    state: RwLock<CacheState>,
    path: Option<PathBuf>,
}

impl ClientCache {
    /// A memory-only cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache persisted to the given file, seeded from it when it exists.
    ///
    /// A missing file starts empty; an unreadable or malformed file is logged
    /// and treated as empty, since the cache holds nothing authoritative.
    pub async fn load_from_file<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Discarding malformed cache file");
                    CacheState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheState::default(),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to read cache file");
                CacheState::default()
            }
        };

        Self {
            state: RwLock::new(state),
            path: Some(path),
        }
    }

    /// The cached session token, if any.
    pub fn session(&self) -> Option<String> {
        self.state.read().unwrap().current_session.clone()
    }

    /// Remember the current session token.
    pub async fn set_session(&self, session_id: &str) {
        self.state.write().unwrap().current_session = Some(session_id.to_string());
        self.persist().await;
    }

    /// Forget the cached session if it matches the given token. Returns
    /// whether anything was cleared.
    pub async fn clear_session_if(&self, session_id: &str) -> bool {
        let cleared = {
            let mut state = self.state.write().unwrap();
            if state.current_session.as_deref() == Some(session_id) {
                state.current_session = None;
                true
            } else {
                false
            }
        };

        if cleared {
            self.persist().await;
        }
        cleared
    }

    /// The last user who authenticated on this device, if any.
    pub fn last_user(&self) -> Option<LastKnownUser> {
        self.state.read().unwrap().last_user.clone()
    }

    /// Remember who just authenticated.
    pub async fn remember_user(&self, record: &UserRecord) {
        self.state.write().unwrap().last_user = Some(record.into());
        self.persist().await;
    }

    /// Drop everything cached.
    pub async fn clear(&self) {
        *self.state.write().unwrap() = CacheState::default();
        self.persist().await;
    }

    async fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        // Serialize under the guard, write after releasing it.
        let contents = {
            let state = self.state.read().unwrap();
            match serde_json::to_string_pretty(&*state) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to serialize cache state");
                    return;
                }
            }
        };

        if let Err(e) = tokio::fs::write(path, contents).await {
            tracing::warn!(error = %e, path = %path.display(), "Failed to persist cache file");
        }
    }
}
