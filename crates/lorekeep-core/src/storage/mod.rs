//! Storage layer (`SQLite`)

pub mod backups;
pub mod campaigns;
pub mod db;
pub mod legacy;
pub mod local;
pub mod migrations;
pub mod settings;

pub use backups::BackupStore;
pub use campaigns::CampaignStore;
pub use db::{Database, StorageError};
pub use legacy::LegacyMigration;
pub use local::LocalStore;
pub use settings::SettingsStore;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 timestamp that sorts lexically in time order
pub(crate) fn sortable_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
