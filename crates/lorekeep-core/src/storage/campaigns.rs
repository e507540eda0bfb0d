//! Campaign storage operations

use crate::campaign::CampaignRecord;
use crate::storage::db::StorageError;
use crate::storage::sortable_timestamp;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

/// Campaign storage operations
pub struct CampaignStore<'a> {
    conn: &'a Connection,
}

impl<'a> CampaignStore<'a> {
    /// Create a new campaign store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or replace a campaign, stamping `updated_at`
    ///
    /// The original `created_at` survives an overwrite.
    ///
    /// # Errors
    /// Returns an error if the campaign cannot be written
    pub fn save(&self, record: &CampaignRecord) -> Result<CampaignRecord, StorageError> {
        let mut stamped = record.clone();
        stamped.updated_at = Utc::now();

        if let Some(existing) = self.get(&stamped.id)? {
            stamped.created_at = existing.created_at;
        }

        let json = serde_json::to_string(&stamped)?;

        self.conn.execute(
            r"
            INSERT INTO campaigns (id, name, data, version, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                data = excluded.data,
                version = excluded.version,
                updated_at = excluded.updated_at
            ",
            params![
                stamped.id,
                stamped.name,
                json,
                stamped.version,
                sortable_timestamp(stamped.created_at),
                sortable_timestamp(stamped.updated_at),
            ],
        )?;

        Ok(stamped)
    }

    /// Get a campaign by ID
    ///
    /// # Errors
    /// Returns an error if the campaign cannot be read
    pub fn get(&self, id: &str) -> Result<Option<CampaignRecord>, StorageError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM campaigns WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| parse_campaign(&json)).transpose()
    }

    /// List all campaigns, most recently updated first
    ///
    /// # Errors
    /// Returns an error if the campaigns cannot be listed
    pub fn list(&self) -> Result<Vec<CampaignRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT data FROM campaigns
            ORDER BY updated_at DESC, rowid DESC
            ",
        )?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut campaigns = Vec::new();
        for row in rows {
            campaigns.push(parse_campaign(&row?)?);
        }

        Ok(campaigns)
    }

    /// The most recently updated campaign
    ///
    /// # Errors
    /// Returns an error if the campaigns cannot be read
    pub fn latest(&self) -> Result<Option<CampaignRecord>, StorageError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM campaigns ORDER BY updated_at DESC, rowid DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| parse_campaign(&json)).transpose()
    }
}

fn parse_campaign(json: &str) -> Result<CampaignRecord, StorageError> {
    serde_json::from_str(json)
        .map_err(|e| StorageError::Corrupt(format!("Failed to parse campaign: {e}")))
}
