//! Lorekeep Core - campaign storage, state sync, backups and transfer
//!
//! This crate provides the `SQLite` local store, the live-state persistence
//! bridge, the automatic backup scheduler and the export/import bundle format.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod backup;
pub mod campaign;
pub mod storage;
pub mod sync;
pub mod transfer;

pub use backup::{BackupPolicy, BackupRecord, BackupScheduler, BackupType};
pub use campaign::{
    CampaignRecord, CampaignSelector, CAMPAIGN_DATA_VERSION, CURRENT_CAMPAIGN_ID,
};
pub use storage::{LocalStore, StorageError};
pub use sync::{LiveState, StateSync};
