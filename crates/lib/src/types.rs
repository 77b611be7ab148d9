//! Core data types for the account system

use chrono::{DateTime, Utc};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// A single member account.
///
/// The email is the unique key within a store and is always normalized to
/// lowercase before comparison or storage. `login_attempts` and
/// `locked_until` are derived state: they are only ever written by the
/// account service applying the lockout policy, never by callers.
///
/// Wire names are camelCase to match the remote JSON-document API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Time-derived identifier, unique within a store
    pub id: String,

    /// Display name, free text
    pub full_name: String,

    /// Normalized (lowercase) email, unique within a store
    pub email: String,

    /// Credential digest; the plaintext password is never stored
    pub password_digest: String,

    /// When the account was created
    pub registration_date: DateTime<Utc>,

    /// Last successful login, if any
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,

    /// Inactive accounts may not authenticate and are excluded from listing,
    /// but the record persists
    pub is_active: bool,

    /// Consecutive failed logins since the last success
    #[serde(default)]
    pub login_attempts: u32,

    /// While in the future, authentication is refused regardless of password
    #[serde(default)]
    pub locked_until: Option<DateTime<Utc>>,

    /// Membership tier
    #[serde(default)]
    pub membership_type: MembershipType,

    /// Opaque last-seen client fingerprint; advisory only, never used for
    /// authorization
    #[serde(default)]
    pub device_info: Option<String>,

    /// Last password change, if any
    #[serde(default)]
    pub password_changed_at: Option<DateTime<Utc>>,

    /// Set when this record was pushed to the remote set by reconciliation
    #[serde(default, skip_serializing_if = "is_false")]
    pub synced_from_local: bool,
}

fn is_false(value: &bool) -> bool {
    !value
}

impl UserRecord {
    /// Project this record into its safe listing view (no digest, no lockout
    /// counters).
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            registration_date: self.registration_date,
            last_login: self.last_login,
            membership_type: self.membership_type,
            device_info: self.device_info.clone(),
        }
    }
}

/// Membership tier of an account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipType {
    #[default]
    Basic,
    Premium,
    Elite,
}

impl MembershipType {
    /// Lowercase tag used on the wire and in the local database.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Basic => "basic",
            MembershipType::Premium => "premium",
            MembershipType::Elite => "elite",
        }
    }

    /// Parse the lowercase tag. Unknown tags are rejected so corrupt rows can
    /// be quarantined by the caller.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "basic" => Some(MembershipType::Basic),
            "premium" => Some(MembershipType::Premium),
            "elite" => Some(MembershipType::Elite),
            _ => None,
        }
    }
}

impl std::fmt::Display for MembershipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safe listing view of a [`UserRecord`].
///
/// Excludes the password digest and the lockout counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub registration_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub membership_type: MembershipType,
    pub device_info: Option<String>,
}

/// An authenticated session token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque collision-resistant token
    pub session_id: String,

    /// Owning user id. A reference, not ownership: deleting the user does
    /// not remove the session row.
    pub user_id: String,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Cleared on logout, never resurrected
    pub is_active: bool,
}

impl Session {
    /// Whether the session has passed its expiry at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// What a user did, for the activity log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    UserRegistered,
    UserLogin,
    FailedLogin,
    UserLogout,
    PasswordChanged,
    AccountDeleted,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::UserRegistered => "USER_REGISTERED",
            ActivityKind::UserLogin => "USER_LOGIN",
            ActivityKind::FailedLogin => "FAILED_LOGIN",
            ActivityKind::UserLogout => "USER_LOGOUT",
            ActivityKind::PasswordChanged => "PASSWORD_CHANGED",
            ActivityKind::AccountDeleted => "ACCOUNT_DELETED",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "USER_REGISTERED" => Some(ActivityKind::UserRegistered),
            "USER_LOGIN" => Some(ActivityKind::UserLogin),
            "FAILED_LOGIN" => Some(ActivityKind::FailedLogin),
            "USER_LOGOUT" => Some(ActivityKind::UserLogout),
            "PASSWORD_CHANGED" => Some(ActivityKind::PasswordChanged),
            "ACCOUNT_DELETED" => Some(ActivityKind::AccountDeleted),
            _ => None,
        }
    }
}

/// One row of the per-user activity log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub user_id: String,
    pub action: ActivityKind,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    /// Build a log row stamped with the clock's current time.
    pub fn new(
        clock: &dyn Clock,
        user_id: impl Into<String>,
        action: ActivityKind,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            action,
            details: details.into(),
            timestamp: clock.now_utc(),
        }
    }
}

/// Normalize an email for comparison and storage: trimmed and lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Generate a fresh time-derived user id: `user_<millis>_<random>`.
pub fn new_user_id(clock: &dyn Clock) -> String {
    format!("user_{}_{}", clock.now_millis(), random_suffix(6))
}

/// Generate a fresh session token: `session_<millis>_<random>`.
pub fn new_session_id(clock: &dyn Clock) -> String {
    format!("session_{}_{}", clock.now_millis(), random_suffix(9))
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
