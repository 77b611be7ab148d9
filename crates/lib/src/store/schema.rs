//! Local database schema and migrations.
//!
//! The on-device schema has three collections: `users` (unique index on
//! email), `sessions`, and `user_activity`, plus a `schema_version` table so
//! future additions can migrate forward.
//!
//! # Migration System
//!
//! Migrations are code-based functions rather than SQL files.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`
//! 4. Document what the migration does

use sqlx::SqlitePool;

use crate::Result;
use crate::store::errors::StoreError;

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
///
/// Timestamps are stored as milliseconds since epoch (BIGINT) so range
/// comparisons work without string parsing.
pub const CREATE_TABLES: &[&str] = &[
    // Schema version tracking
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // User records, one row per account
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        password_digest TEXT NOT NULL,
        registration_date BIGINT NOT NULL,
        last_login BIGINT,
        is_active BIGINT NOT NULL DEFAULT 1,
        login_attempts BIGINT NOT NULL DEFAULT 0,
        locked_until BIGINT,
        membership_type TEXT NOT NULL DEFAULT 'basic',
        device_info TEXT,
        password_changed_at BIGINT,
        synced_from_local BIGINT NOT NULL DEFAULT 0
    )",
    // Session tokens, device-local only
    "CREATE TABLE IF NOT EXISTS sessions (
        session_id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        expires_at BIGINT NOT NULL,
        is_active BIGINT NOT NULL DEFAULT 1
    )",
    // Append-only activity log
    "CREATE TABLE IF NOT EXISTS user_activity (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        action TEXT NOT NULL,
        details TEXT NOT NULL,
        timestamp BIGINT NOT NULL
    )",
];

/// SQL statements to create indexes.
///
/// The unique email index enforces the one-record-per-email invariant at the
/// storage layer; violations surface as a distinct error.
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)",
    "CREATE INDEX IF NOT EXISTS idx_users_registration ON users(registration_date)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_activity_user ON user_activity(user_id, timestamp)",
];

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(pool: &SqlitePool) -> Result<()> {
    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Sqlx {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::Sqlx {
            reason: format!("Failed to check schema version: {e}"),
            source: Some(e),
        })?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .map_err(|e| StoreError::Sqlx {
                    reason: format!("Failed to initialize schema version: {e}"),
                    source: Some(e),
                })?;
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(pool, current, SCHEMA_VERSION).await?;
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Sqlx {
                reason: format!("Index creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    Ok(())
}

/// Run migrations sequentially from one schema version to another.
async fn migrate(pool: &SqlitePool, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting local schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(pool, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = ?")
            .bind(next)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Sqlx {
                reason: format!("Failed to update schema version to {next}: {e}"),
                source: Some(e),
            })?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    Ok(())
}

/// Execute a single migration step.
///
/// When adding the first migration, replace the body with:
///
/// ```ignore
/// match from {
///     1 => migrate_v1_to_v2(pool).await,
///     _ => Err(StoreError::Sqlx { ... }.into()),
/// }
/// ```
async fn run_migration(pool: &SqlitePool, from: i64, to: i64) -> Result<()> {
    // No migrations exist yet, so any attempt to migrate is an error.
    let _ = pool;

    Err(StoreError::Sqlx {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             This likely means SCHEMA_VERSION was incremented without adding a migration."
        ),
        source: None,
    }
    .into())
}
