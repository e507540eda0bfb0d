//! Backup storage operations

use crate::backup::{BackupRecord, BackupType};
use crate::storage::db::StorageError;
use crate::storage::sortable_timestamp;
use rusqlite::{params, Connection, OptionalExtension};

/// Backup storage operations
pub struct BackupStore<'a> {
    conn: &'a Connection,
}

impl<'a> BackupStore<'a> {
    /// Create a new backup store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Store a new backup record
    ///
    /// Backups are immutable; writing an id that already exists is an error.
    ///
    /// # Errors
    /// Returns an error if the backup cannot be created
    pub fn create(&self, backup: &BackupRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(backup)?;

        self.conn.execute(
            r"
            INSERT INTO backups (id, name, type, size, data, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                backup.id,
                backup.name,
                backup.backup_type.as_str(),
                i64::try_from(backup.size).unwrap_or(i64::MAX),
                json,
                sortable_timestamp(backup.created_at),
            ],
        )?;

        Ok(())
    }

    /// Get a backup by ID
    ///
    /// # Errors
    /// Returns an error if the backup cannot be retrieved
    pub fn get(&self, id: &str) -> Result<Option<BackupRecord>, StorageError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM backups WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| parse_backup(&json)).transpose()
    }

    /// List all backups, newest first
    ///
    /// # Errors
    /// Returns an error if the backups cannot be listed
    pub fn list_all(&self) -> Result<Vec<BackupRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT data FROM backups
            ORDER BY created_at DESC, rowid DESC
            ",
        )?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut backups = Vec::new();
        for row in rows {
            backups.push(parse_backup(&row?)?);
        }

        Ok(backups)
    }

    /// Count backups of one type
    ///
    /// # Errors
    /// Returns an error if the count cannot be read
    pub fn count(&self, backup_type: BackupType) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM backups WHERE type = ?1",
            params![backup_type.as_str()],
            |row| row.get(0),
        )?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Delete a backup record
    ///
    /// # Errors
    /// Returns an error if the backup cannot be deleted
    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM backups WHERE id = ?1", params![id])?;

        Ok(deleted > 0)
    }

    /// Delete the oldest backups of one type beyond `keep`
    ///
    /// Returns the ids that were removed, oldest first.
    ///
    /// # Errors
    /// Returns an error if the backups cannot be deleted
    pub fn prune(&self, backup_type: BackupType, keep: usize) -> Result<Vec<String>, StorageError> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            r"
            SELECT id FROM backups
            WHERE type = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT -1 OFFSET ?2
            ",
        )?;
        let mut excess = stmt
            .query_map(params![backup_type.as_str(), keep], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        excess.reverse();

        for id in &excess {
            self.conn
                .execute("DELETE FROM backups WHERE id = ?1", params![id])?;
        }

        Ok(excess)
    }
}

fn parse_backup(json: &str) -> Result<BackupRecord, StorageError> {
    serde_json::from_str(json)
        .map_err(|e| StorageError::Corrupt(format!("Failed to parse backup: {e}")))
}
