//! Campaign backups: snapshots, retention, restore and the automatic scheduler

pub mod policy;
pub mod scheduler;
pub mod snapshot;
pub mod stats;
mod types;

use thiserror::Error;

use crate::storage::StorageError;

pub use policy::{BackupPolicy, BACKUP_CONFIG_KEY};
pub use scheduler::{BackupScheduler, SchedulerState};
pub use snapshot::{campaign_from_backup, create_backup, restore_backup};
pub use stats::BackupStats;
pub use types::{BackupPayload, BackupRecord, BackupType};

/// Errors from backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Invalid backup policy: {0}")]
    InvalidPolicy(String),
}
