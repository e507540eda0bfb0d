//! Database migrations
//!
//! Migrations are additive only. A version bump may create new tables or
//! indexes; it never drops or renames an existing one, so a database written by
//! an older build keeps every campaign and backup it already holds.

use rusqlite::Connection;

use super::db::StorageError;

pub const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
///
/// # Errors
/// Returns an error if migrations fail
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version > CURRENT_VERSION {
        return Err(StorageError::Migration(format!(
            "database version {version} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)?;
    Ok(())
}

pub(crate) fn migrate_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r"
        -- Campaigns table
        -- Full campaign tree stored as JSON in data column
        CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            version TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- Backups table
        -- Embedded snapshot payload stored as JSON in data column
        CREATE TABLE IF NOT EXISTS backups (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('auto', 'manual')),
            size INTEGER NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_campaigns_updated ON campaigns(updated_at);
        CREATE INDEX IF NOT EXISTS idx_backups_created ON backups(created_at);
        ",
    )?;

    Ok(())
}

fn migrate_v2(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r"
        -- Settings table
        -- Process-wide key/value configuration, value stored as JSON
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_backups_type_created ON backups(type, created_at);
        ",
    )?;

    Ok(())
}
