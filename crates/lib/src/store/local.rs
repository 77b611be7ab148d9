//! On-device record store backed by SQLite.
//!
//! This is the durable, indexed store a single device uses on its own. The
//! schema (three collections, unique email index, version tracking) lives in
//! [`schema`](super::schema). Rows that fail shape checks on read are skipped
//! with a warning instead of failing the whole read, so one corrupt record
//! cannot take the account system down.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{Row, sqlite::SqliteRow};

use crate::Result;
use crate::store::errors::StoreError;
use crate::store::{ActivityLog, RecordSet, RecordStore, SessionStore, WriteReceipt, schema};
use crate::types::{ActivityEntry, ActivityKind, MembershipType, Session, UserRecord};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Adds a method to convert sqlx errors to [`StoreError::Sqlx`] with a
/// context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to StoreError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            StoreError::Sqlx {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// SQLite-backed store implementing all three storage traits.
///
/// The connection pool provides interior synchronization; `save_all` runs
/// inside a transaction so concurrent readers never observe a partial write.
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Open (or create) a database file at the given path.
    pub async fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .sql_context("Failed to open local database")?;

        // WAL for concurrent readers, bounded lock waits
        for pragma in [
            "PRAGMA journal_mode = WAL",
            "PRAGMA synchronous = NORMAL",
            "PRAGMA busy_timeout = 5000",
        ] {
            sqlx::query(pragma)
                .execute(&pool)
                .await
                .sql_context("Failed to configure local database")?;
        }

        let store = Self { pool };
        schema::initialize(&store.pool).await?;
        Ok(store)
    }

    /// Create an in-memory database that lives as long as this store.
    ///
    /// A single pooled connection keeps the in-memory database alive and
    /// serializes writers. Useful for tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .sql_context("Failed to open in-memory database")?;

        let store = Self { pool };
        schema::initialize(&store.pool).await?;
        Ok(store)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

fn opt_millis_to_utc(ms: Option<i64>) -> std::result::Result<Option<DateTime<Utc>>, String> {
    match ms {
        None => Ok(None),
        Some(ms) => millis_to_utc(ms)
            .map(Some)
            .ok_or_else(|| format!("timestamp out of range: {ms}")),
    }
}

/// Decode one `users` row, reporting the reason when the row is malformed.
fn row_to_record(row: &SqliteRow) -> std::result::Result<UserRecord, String> {
    let membership_tag: String = row.try_get("membership_type").map_err(|e| e.to_string())?;
    let membership_type = MembershipType::parse(&membership_tag)
        .ok_or_else(|| format!("unknown membership tag: {membership_tag}"))?;

    let registration_millis: i64 = row
        .try_get("registration_date")
        .map_err(|e| e.to_string())?;
    let registration_date = millis_to_utc(registration_millis)
        .ok_or_else(|| format!("registration date out of range: {registration_millis}"))?;

    Ok(UserRecord {
        id: row.try_get("id").map_err(|e| e.to_string())?,
        full_name: row.try_get("full_name").map_err(|e| e.to_string())?,
        email: row.try_get("email").map_err(|e| e.to_string())?,
        password_digest: row.try_get("password_digest").map_err(|e| e.to_string())?,
        registration_date,
        last_login: opt_millis_to_utc(row.try_get("last_login").map_err(|e| e.to_string())?)?,
        is_active: row.try_get::<i64, _>("is_active").map_err(|e| e.to_string())? != 0,
        login_attempts: row
            .try_get::<i64, _>("login_attempts")
            .map_err(|e| e.to_string())?
            .max(0) as u32,
        locked_until: opt_millis_to_utc(row.try_get("locked_until").map_err(|e| e.to_string())?)?,
        membership_type,
        device_info: row.try_get("device_info").map_err(|e| e.to_string())?,
        password_changed_at: opt_millis_to_utc(
            row.try_get("password_changed_at")
                .map_err(|e| e.to_string())?,
        )?,
        synced_from_local: row
            .try_get::<i64, _>("synced_from_local")
            .map_err(|e| e.to_string())?
            != 0,
    })
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn get_all(&self) -> Result<RecordSet> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY registration_date, id")
            .fetch_all(&self.pool)
            .await
            .sql_context("Failed to read user records")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match row_to_record(row) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    // Quarantine: skip the corrupt row, keep serving the rest
                    tracing::warn!(%reason, "Skipping corrupt user row");
                }
            }
        }

        Ok(RecordSet {
            records,
            degraded: false,
        })
    }

    async fn save_all(&self, records: &[UserRecord]) -> Result<WriteReceipt> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin write transaction")?;

        sqlx::query("DELETE FROM users")
            .execute(&mut *tx)
            .await
            .sql_context("Failed to clear user records")?;

        for record in records {
            let insert = sqlx::query(
                "INSERT INTO users (
                    id, full_name, email, password_digest, registration_date,
                    last_login, is_active, login_attempts, locked_until,
                    membership_type, device_info, password_changed_at, synced_from_local
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.id)
            .bind(&record.full_name)
            .bind(&record.email)
            .bind(&record.password_digest)
            .bind(record.registration_date.timestamp_millis())
            .bind(record.last_login.map(|t| t.timestamp_millis()))
            .bind(record.is_active as i64)
            .bind(record.login_attempts as i64)
            .bind(record.locked_until.map(|t| t.timestamp_millis()))
            .bind(record.membership_type.as_str())
            .bind(&record.device_info)
            .bind(record.password_changed_at.map(|t| t.timestamp_millis()))
            .bind(record.synced_from_local as i64)
            .execute(&mut *tx)
            .await;

            if let Err(e) = insert {
                // The unique email index is the storage-layer guard for the
                // one-record-per-email invariant; report it distinctly.
                if let sqlx::Error::Database(db) = &e
                    && db.is_unique_violation()
                {
                    return Err(StoreError::DuplicateEmail {
                        email: record.email.clone(),
                    }
                    .into());
                }
                return Err(StoreError::Sqlx {
                    reason: format!("Failed to write user record {}: {e}", record.id),
                    source: Some(e),
                }
                .into());
            }
        }

        tx.commit()
            .await
            .sql_context("Failed to commit user records")?;

        Ok(WriteReceipt { degraded: false })
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT session_id, user_id, created_at, expires_at, is_active
             FROM sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .sql_context("Failed to read session")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_millis: i64 = row.try_get("created_at").sql_context("session row")?;
        let expires_millis: i64 = row.try_get("expires_at").sql_context("session row")?;
        let (Some(created_at), Some(expires_at)) =
            (millis_to_utc(created_millis), millis_to_utc(expires_millis))
        else {
            tracing::warn!(session_id, "Skipping corrupt session row");
            return Ok(None);
        };

        Ok(Some(Session {
            session_id: row.try_get("session_id").sql_context("session row")?,
            user_id: row.try_get("user_id").sql_context("session row")?,
            created_at,
            expires_at,
            is_active: row
                .try_get::<i64, _>("is_active")
                .sql_context("session row")?
                != 0,
        }))
    }

    async fn put_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO sessions (session_id, user_id, created_at, expires_at, is_active)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(session.created_at.timestamp_millis())
        .bind(session.expires_at.timestamp_millis())
        .bind(session.is_active as i64)
        .execute(&self.pool)
        .await
        .sql_context("Failed to write session")?;

        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        // Strictly past, matching the lazy expiry check: a session still
        // valid at this exact instant is not swept.
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .sql_context("Failed to sweep expired sessions")?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ActivityLog for LocalStore {
    async fn record(&self, entry: &ActivityEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_activity (id, user_id, action, details, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.details)
        .bind(entry.timestamp.timestamp_millis())
        .execute(&self.pool)
        .await
        .sql_context("Failed to write activity entry")?;

        Ok(())
    }

    async fn recent(&self, user_id: &str, limit: u32) -> Result<Vec<ActivityEntry>> {
        let rows = sqlx::query(
            "SELECT id, user_id, action, details, timestamp
             FROM user_activity WHERE user_id = ?
             ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to read activity log")?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let action_tag: String = row.try_get("action").sql_context("activity row")?;
            let millis: i64 = row.try_get("timestamp").sql_context("activity row")?;
            let (Some(action), Some(timestamp)) =
                (ActivityKind::parse(&action_tag), millis_to_utc(millis))
            else {
                tracing::warn!(action_tag, "Skipping corrupt activity row");
                continue;
            };

            entries.push(ActivityEntry {
                id: row.try_get("id").sql_context("activity row")?,
                user_id: row.try_get("user_id").sql_context("activity row")?,
                action,
                details: row.try_get("details").sql_context("activity row")?,
                timestamp,
            });
        }

        Ok(entries)
    }
}
