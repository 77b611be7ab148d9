//! Account operations.
//!
//! [`AccountService`] is the single entry point for registration,
//! authentication, password changes, deletion, and listing. It owns the
//! input validation and lockout bookkeeping, delegates storage to a
//! [`RecordStore`], and wraps every storage fault in
//! [`AccountError::BackendUnavailable`] so raw store errors never escape
//! this boundary.
//!
//! Mutations are read-modify-write over the whole record set: `get_all`,
//! change in memory, `save_all`. The store's write atomicity is what keeps
//! concurrent callers from observing partial sets.

use std::sync::Arc;

use crate::cache::ClientCache;
use crate::clock::Clock;
use crate::crypto::CredentialHasher;
use crate::store::{ActivityLog, RecordStore, StoreError};
use crate::types::{
    ActivityEntry, ActivityKind, MembershipType, UserRecord, UserSummary, new_user_id,
    normalize_email,
};
use crate::{Result, lockout};

pub mod errors;

pub use errors::AccountError;

/// A successfully registered account.
#[derive(Clone, Debug)]
pub struct Registered {
    /// The stored record, digest included.
    pub record: UserRecord,
    /// True when the write landed on a fallback backend.
    pub degraded: bool,
}

/// A successful authentication.
#[derive(Clone, Debug)]
pub struct Authenticated {
    /// The stored record after the login bookkeeping.
    pub record: UserRecord,
    /// True when a fallback backend served the attempt.
    pub degraded: bool,
}

/// Registration, authentication, and account maintenance over a record
/// store.
pub struct AccountService {
    records: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    hasher: CredentialHasher,
    activity: Option<Arc<dyn ActivityLog>>,
    cache: Option<Arc<ClientCache>>,
    device_info: Option<String>,
}

impl AccountService {
    /// Build a service over the given store with the default hasher.
    pub fn new(records: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            records,
            clock,
            hasher: CredentialHasher::default(),
            activity: None,
            cache: None,
            device_info: None,
        }
    }

    /// Use a non-default credential hasher.
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Record account events into an activity log. Logging is best effort;
    /// a log failure never fails the operation it describes.
    pub fn with_activity_log(mut self, activity: Arc<dyn ActivityLog>) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Refresh a client cache's last-user summary on successful logins.
    pub fn with_cache(mut self, cache: Arc<ClientCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Stamp this device description onto records at login time.
    pub fn with_device_info(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = Some(device_info.into());
        self
    }

    /// Create a new account.
    ///
    /// The email is normalized before the duplicate check, so
    /// `John@Demo.com` and `john@demo.com` are the same account.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Registered> {
        let full_name = full_name.trim();
        validate_full_name(full_name)?;
        validate_email(email)?;
        validate_password(password)?;

        let normalized = normalize_email(email);
        let set = self.records.get_all().await.map_err(map_store_error)?;

        if set.records.iter().any(|r| r.email == normalized) {
            return Err(AccountError::DuplicateEmail { email: normalized }.into());
        }

        let record = UserRecord {
            id: new_user_id(self.clock.as_ref()),
            full_name: full_name.to_string(),
            email: normalized,
            password_digest: self.hasher.digest(password),
            registration_date: self.clock.now_utc(),
            last_login: None,
            is_active: true,
            login_attempts: 0,
            locked_until: None,
            membership_type: MembershipType::Basic,
            device_info: self.device_info.clone(),
            password_changed_at: None,
            synced_from_local: false,
        };

        let mut records = set.records;
        records.push(record.clone());
        let receipt = self
            .records
            .save_all(&records)
            .await
            .map_err(map_store_error)?;

        tracing::info!(user_id = %record.id, "Account registered");
        self.log_activity(&record.id, ActivityKind::UserRegistered, "New member registration")
            .await;

        Ok(Registered {
            record,
            degraded: set.degraded || receipt.degraded,
        })
    }

    /// Verify credentials and perform the login bookkeeping.
    ///
    /// Deactivated accounts are indistinguishable from missing ones. A wrong
    /// password on a live account counts toward the lockout; the failure
    /// counter is persisted best effort so a storage fault on that path does
    /// not mask the credential rejection.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Authenticated> {
        let normalized = normalize_email(email);
        let set = self.records.get_all().await.map_err(map_store_error)?;
        let mut records = set.records;

        let Some(index) = records
            .iter()
            .position(|r| r.email == normalized && r.is_active)
        else {
            return Err(AccountError::UserNotFound { email: normalized }.into());
        };

        let now = self.clock.now_utc();
        if let lockout::LockoutDecision::Locked { until } = lockout::evaluate(&records[index], now)
        {
            return Err(AccountError::AccountLocked { until }.into());
        }

        if !self.hasher.verify(password, &records[index].password_digest) {
            lockout::note_failure(&mut records[index], now);
            let remaining = lockout::attempts_remaining(&records[index]);
            let user_id = records[index].id.clone();

            if let Err(err) = self.records.save_all(&records).await {
                tracing::warn!(error = %err, "Failed to persist login-attempt counter");
            }
            self.log_activity(&user_id, ActivityKind::FailedLogin, "Incorrect password")
                .await;

            return Err(AccountError::BadCredentials {
                attempts_remaining: remaining,
            }
            .into());
        }

        lockout::note_success(&mut records[index], now);
        if let Some(device_info) = &self.device_info {
            records[index].device_info = Some(device_info.clone());
        }

        let record = records[index].clone();
        let receipt = self
            .records
            .save_all(&records)
            .await
            .map_err(map_store_error)?;

        if let Some(cache) = &self.cache {
            cache.remember_user(&record).await;
        }

        tracing::info!(user_id = %record.id, "Login successful");
        self.log_activity(&record.id, ActivityKind::UserLogin, "Member login")
            .await;

        Ok(Authenticated {
            record,
            degraded: set.degraded || receipt.degraded,
        })
    }

    /// Replace the password after verifying the current one.
    ///
    /// Verification is a full authentication, so wrong current passwords
    /// count toward the lockout like any other failed login.
    pub async fn change_password(&self, email: &str, current: &str, new: &str) -> Result<()> {
        validate_password(new)?;
        if new == current {
            return Err(AccountError::InvalidInput {
                reason: "New password must differ from the current one".into(),
            }
            .into());
        }

        let authenticated = match self.authenticate(email, current).await {
            Ok(authenticated) => authenticated,
            Err(crate::Error::Account(AccountError::BadCredentials { .. })) => {
                return Err(AccountError::BadCurrentPassword.into());
            }
            Err(err) => return Err(err),
        };

        let normalized = normalize_email(email);
        let set = self.records.get_all().await.map_err(map_store_error)?;
        let mut records = set.records;
        let Some(record) = records.iter_mut().find(|r| r.email == normalized) else {
            return Err(AccountError::UserNotFound { email: normalized }.into());
        };

        record.password_digest = self.hasher.digest(new);
        record.password_changed_at = Some(self.clock.now_utc());
        let user_id = record.id.clone();

        self.records
            .save_all(&records)
            .await
            .map_err(map_store_error)?;

        tracing::info!(user_id = %authenticated.record.id, "Password changed");
        self.log_activity(&user_id, ActivityKind::PasswordChanged, "Password updated")
            .await;

        Ok(())
    }

    /// Remove an account entirely.
    ///
    /// Open sessions for the deleted user are not revoked here; they fail
    /// the owner check on their next validation.
    pub async fn delete_account(&self, email: &str) -> Result<()> {
        let normalized = normalize_email(email);
        let set = self.records.get_all().await.map_err(map_store_error)?;
        let mut records = set.records;

        let Some(index) = records.iter().position(|r| r.email == normalized) else {
            return Err(AccountError::UserNotFound { email: normalized }.into());
        };

        let removed = records.remove(index);
        self.records
            .save_all(&records)
            .await
            .map_err(map_store_error)?;

        tracing::info!(user_id = %removed.id, "Account deleted");
        self.log_activity(&removed.id, ActivityKind::AccountDeleted, "Account removed")
            .await;

        Ok(())
    }

    /// Digest-free summaries of every active account.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let set = self.records.get_all().await.map_err(map_store_error)?;
        Ok(set
            .records
            .iter()
            .filter(|r| r.is_active)
            .map(UserRecord::summary)
            .collect())
    }

    async fn log_activity(
        &self,
        user_id: &str,
        action: ActivityKind,
        details: impl Into<String>,
    ) {
        let Some(activity) = &self.activity else {
            return;
        };

        let entry = ActivityEntry::new(self.clock.as_ref(), user_id, action, details);
        if let Err(err) = activity.record(&entry).await {
            tracing::warn!(error = %err, action = %action.as_str(), "Failed to record activity");
        }
    }
}

/// Wrap storage faults at the service boundary. A duplicate-email violation
/// surfacing from the store's unique index becomes the business rejection it
/// represents.
fn map_store_error(err: crate::Error) -> crate::Error {
    match err {
        crate::Error::Store(StoreError::DuplicateEmail { email }) => {
            AccountError::DuplicateEmail { email }.into()
        }
        crate::Error::Store(source) => AccountError::BackendUnavailable { source }.into(),
        other => other,
    }
}

fn validate_full_name(full_name: &str) -> Result<()> {
    if full_name.chars().count() < 2 {
        return Err(AccountError::InvalidInput {
            reason: "Full name must be at least 2 characters".into(),
        }
        .into());
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };

    if !valid {
        return Err(AccountError::InvalidInput {
            reason: "Email address is not valid".into(),
        }
        .into());
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 6 {
        return Err(AccountError::InvalidInput {
            reason: "Password must be at least 6 characters".into(),
        }
        .into());
    }
    Ok(())
}
