//! Shared handle over the local database
//!
//! `LocalStore` is cheap to clone and safe to share between the persistence
//! task, the backup scheduler and user-triggered operations. The connection is
//! opened lazily by [`LocalStore::init`] and reused afterwards.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error};

use crate::backup::{BackupRecord, BackupType};
use crate::campaign::CampaignRecord;
use crate::storage::{BackupStore, CampaignStore, Database, SettingsStore, StorageError};

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

struct Inner {
    location: Location,
    db: Mutex<Option<Database>>,
}

/// Durable local storage for campaigns, backups and settings
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<Inner>,
}

impl LocalStore {
    /// Handle for a database file; nothing is opened until first use
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    /// Handle for a private in-memory database
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            inner: Arc::new(Inner {
                location,
                db: Mutex::new(None),
            }),
        }
    }

    /// Database file path, `None` for in-memory stores
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.inner.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    /// Open the database if it is not open yet
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated
    pub fn init(&self) -> Result<(), StorageError> {
        self.with_db(|_| Ok(()))
    }

    /// Whether the connection has been opened
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner
            .db
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run `f` against the open database, opening it first if needed
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or `f` fails
    pub fn with_db<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Database) -> Result<T, StorageError>,
    {
        // A panic mid-call leaves the connection itself usable
        let mut guard = self
            .inner
            .db
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if guard.is_none() {
            let db = match &self.inner.location {
                Location::File(path) => Database::open(path),
                Location::Memory => Database::in_memory(),
            }
            .map_err(|e| {
                error!(error = %e, "failed to open local store");
                e
            })?;
            debug!(location = ?self.inner.location, "local store opened");
            *guard = Some(db);
        }

        match guard.as_ref() {
            Some(db) => f(db),
            None => Err(StorageError::Migration("database not initialized".to_string())),
        }
    }

    // Campaigns

    /// Upsert a campaign by id, stamping `updated_at`
    ///
    /// # Errors
    /// Returns an error if the campaign cannot be written
    pub fn save_campaign(&self, record: &CampaignRecord) -> Result<CampaignRecord, StorageError> {
        self.with_db(|db| CampaignStore::new(db.connection()).save(record))
    }

    /// Load a campaign; `Ok(None)` when no such campaign exists
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn get_campaign(&self, id: &str) -> Result<Option<CampaignRecord>, StorageError> {
        self.with_db(|db| CampaignStore::new(db.connection()).get(id))
    }

    /// All campaigns, most recently updated first
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn get_all_campaigns(&self) -> Result<Vec<CampaignRecord>, StorageError> {
        self.with_db(|db| CampaignStore::new(db.connection()).list())
    }

    /// The campaign with the latest `updated_at`
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn latest_campaign(&self) -> Result<Option<CampaignRecord>, StorageError> {
        self.with_db(|db| CampaignStore::new(db.connection()).latest())
    }

    // Backups

    /// Store a new backup
    ///
    /// # Errors
    /// Returns an error if the backup cannot be written
    pub fn save_backup(&self, record: &BackupRecord) -> Result<(), StorageError> {
        self.with_db(|db| BackupStore::new(db.connection()).create(record))
    }

    /// All backups, newest first
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn get_all_backups(&self) -> Result<Vec<BackupRecord>, StorageError> {
        self.with_db(|db| BackupStore::new(db.connection()).list_all())
    }

    /// Load a backup; `Ok(None)` when no such backup exists
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn get_backup(&self, id: &str) -> Result<Option<BackupRecord>, StorageError> {
        self.with_db(|db| BackupStore::new(db.connection()).get(id))
    }

    /// Delete a backup; returns whether it existed
    ///
    /// # Errors
    /// Returns an error if the backup cannot be deleted
    pub fn delete_backup(&self, id: &str) -> Result<bool, StorageError> {
        self.with_db(|db| BackupStore::new(db.connection()).delete(id))
    }

    /// Number of backups of one type
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn count_backups(&self, backup_type: BackupType) -> Result<usize, StorageError> {
        self.with_db(|db| BackupStore::new(db.connection()).count(backup_type))
    }

    /// Delete the oldest automatic backups beyond `max_auto_backups`
    ///
    /// Manual backups are never touched. Returns how many were removed.
    ///
    /// # Errors
    /// Returns an error if the backups cannot be deleted
    pub fn cleanup_old_backups(&self, max_auto_backups: usize) -> Result<usize, StorageError> {
        self.cleanup_backups_of_type(BackupType::Auto, max_auto_backups)
    }

    /// Delete the oldest backups of `backup_type` beyond `keep`
    ///
    /// # Errors
    /// Returns an error if the backups cannot be deleted
    pub fn cleanup_backups_of_type(
        &self,
        backup_type: BackupType,
        keep: usize,
    ) -> Result<usize, StorageError> {
        let removed = self.with_db(|db| BackupStore::new(db.connection()).prune(backup_type, keep))?;
        if !removed.is_empty() {
            debug!(
                backup_type = %backup_type,
                keep,
                removed = removed.len(),
                "evicted old backups"
            );
        }
        Ok(removed.len())
    }

    // Settings

    /// Read a setting
    ///
    /// # Errors
    /// Returns an error if the setting cannot be read
    pub fn get_setting(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.with_db(|db| SettingsStore::new(db.connection()).get(key))
    }

    /// Write a setting
    ///
    /// # Errors
    /// Returns an error if the setting cannot be written
    pub fn set_setting(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.with_db(|db| SettingsStore::new(db.connection()).set(key, value))
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("location", &self.inner.location)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
