//! Session lifecycle.
//!
//! Sessions are device-local bearer tokens: created on successful
//! authentication, valid for twenty-four hours, and checked lazily on every
//! validation. Expiry never mutates storage by itself; a periodic
//! [`sweep_expired`](SessionManager::sweep_expired) physically removes dead
//! rows as hygiene.
//!
//! Deleting or deactivating a user does not invalidate their open sessions
//! eagerly. Validation re-checks the owning record every time, so such
//! sessions fail the owner check from then on.

use std::sync::Arc;

use chrono::Duration;

use crate::Result;
use crate::cache::ClientCache;
use crate::clock::Clock;
use crate::store::{RecordStore, SessionStore};
use crate::types::{Session, UserRecord, new_session_id};

/// How long a session stays valid after creation.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Why a session failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidSessionReason {
    /// No session with that token exists.
    NotFound,
    /// The session existed but its expiry has passed.
    Expired,
    /// The session was explicitly invalidated.
    Inactive,
    /// The owning user record is missing or deactivated.
    UserInactive,
}

/// Outcome of validating a session token.
#[derive(Clone, Debug)]
pub enum SessionValidation {
    /// The session is live; here is its owner.
    Valid(UserRecord),
    /// The session is not usable.
    Invalid(InvalidSessionReason),
}

impl SessionValidation {
    /// The owning record, when validation succeeded.
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            SessionValidation::Valid(record) => Some(record),
            SessionValidation::Invalid(_) => None,
        }
    }
}

/// Creates, validates, and invalidates sessions against a session store.
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    records: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    cache: Option<Arc<ClientCache>>,
}

impl SessionManager {
    /// Build a manager over the given stores.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        records: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            records,
            clock,
            cache: None,
        }
    }

    /// Mirror the current session token into a client cache.
    pub fn with_cache(mut self, cache: Arc<ClientCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Open a session for an authenticated user.
    pub async fn create(&self, user: &UserRecord) -> Result<Session> {
        let now = self.clock.now_utc();
        let session = Session {
            session_id: new_session_id(self.clock.as_ref()),
            user_id: user.id.clone(),
            created_at: now,
            expires_at: now + Duration::hours(SESSION_TTL_HOURS),
            is_active: true,
        };

        self.sessions.put_session(&session).await?;

        if let Some(cache) = &self.cache {
            cache.set_session(&session.session_id).await;
            cache.remember_user(user).await;
        }

        tracing::debug!(user_id = %user.id, "Session created");
        Ok(session)
    }

    /// Check a token and resolve its owner.
    ///
    /// The owner is looked up fresh on every call, so a deactivated or
    /// deleted user cannot ride an old token.
    pub async fn validate(&self, session_id: &str) -> Result<SessionValidation> {
        let Some(session) = self.sessions.get_session(session_id).await? else {
            return Ok(SessionValidation::Invalid(InvalidSessionReason::NotFound));
        };

        if session.is_expired(self.clock.now_utc()) {
            return Ok(SessionValidation::Invalid(InvalidSessionReason::Expired));
        }
        if !session.is_active {
            return Ok(SessionValidation::Invalid(InvalidSessionReason::Inactive));
        }

        let set = self.records.get_all().await?;
        let owner = set
            .records
            .into_iter()
            .find(|r| r.id == session.user_id && r.is_active);

        match owner {
            Some(record) => Ok(SessionValidation::Valid(record)),
            None => Ok(SessionValidation::Invalid(
                InvalidSessionReason::UserInactive,
            )),
        }
    }

    /// Mark a session inactive. Returns whether a session was found.
    ///
    /// Invalidating an unknown token is not an error; the token may already
    /// have been swept.
    pub async fn invalidate(&self, session_id: &str) -> Result<bool> {
        let Some(mut session) = self.sessions.get_session(session_id).await? else {
            return Ok(false);
        };

        session.is_active = false;
        self.sessions.put_session(&session).await?;

        if let Some(cache) = &self.cache {
            cache.clear_session_if(session_id).await;
        }

        tracing::debug!(user_id = %session.user_id, "Session invalidated");
        Ok(true)
    }

    /// Physically remove sessions whose expiry has passed.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let removed = self.sessions.sweep_expired(self.clock.now_utc()).await?;
        if removed > 0 {
            tracing::debug!(removed, "Swept expired sessions");
        }
        Ok(removed)
    }
}
