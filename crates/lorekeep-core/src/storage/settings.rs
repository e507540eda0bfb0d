//! Settings storage operations

use crate::storage::db::StorageError;
use crate::storage::sortable_timestamp;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// Key/value settings storage
pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsStore<'a> {
    /// Create a new settings store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Read a setting
    ///
    /// # Errors
    /// Returns an error if the setting cannot be read or is not valid JSON
    pub fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| StorageError::Corrupt(format!("Invalid setting {key}: {e}")))
        })
        .transpose()
    }

    /// Write a setting, replacing any previous value
    ///
    /// # Errors
    /// Returns an error if the setting cannot be written
    pub fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;

        self.conn.execute(
            r"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, json, sortable_timestamp(Utc::now())],
        )?;

        Ok(())
    }
}
