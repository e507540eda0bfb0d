//! One-time import of the legacy flat state file
//!
//! Early builds kept the whole application state in a single JSON blob,
//! either wrapped as `{"state": {...}, "version": n}` or bare. The blob is
//! imported as the current campaign and then removed, so running the import
//! again is a no-op.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::campaign::{CampaignRecord, DEFAULT_CAMPAIGN_NAME};
use crate::storage::{LocalStore, StorageError};
use crate::sync::domains;

/// Data version assigned to imported legacy state
pub const LEGACY_DATA_VERSION: &str = "1.0.0";

/// Outcome of a legacy import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyMigration {
    /// No legacy file present
    NotFound,
    /// Legacy state became the current campaign
    Imported,
    /// A current campaign already existed; the legacy file was only cleared
    Skipped,
}

impl LocalStore {
    /// Import the legacy state file, then delete it
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not JSON, or the
    /// campaign cannot be written. The legacy file is kept on error.
    pub fn migrate_from_legacy(&self, legacy_path: &Path) -> Result<LegacyMigration, StorageError> {
        if !legacy_path.exists() {
            return Ok(LegacyMigration::NotFound);
        }

        let content = fs::read_to_string(legacy_path)?;
        let blob: Value = serde_json::from_str(&content)?;

        let outcome = if self.get_campaign(crate::CURRENT_CAMPAIGN_ID)?.is_some() {
            warn!(
                path = %legacy_path.display(),
                "current campaign already exists, discarding legacy state"
            );
            LegacyMigration::Skipped
        } else {
            let state = unwrap_state(blob);
            let data = domains::extract_persisted(&state);
            let name = domains::campaign_name(&data)
                .unwrap_or(DEFAULT_CAMPAIGN_NAME)
                .to_string();
            let record = CampaignRecord::current(name, data).with_version(LEGACY_DATA_VERSION);
            self.save_campaign(&record)?;
            info!(path = %legacy_path.display(), "imported legacy campaign state");
            LegacyMigration::Imported
        };

        fs::remove_file(legacy_path)?;
        Ok(outcome)
    }
}

fn unwrap_state(blob: Value) -> Value {
    match blob {
        Value::Object(mut map) if map.get("state").is_some_and(Value::is_object) => {
            map.remove("state").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_noop() {
        let store = LocalStore::in_memory();
        let dir = TempDir::new().unwrap();

        let outcome = store
            .migrate_from_legacy(&dir.path().join("absent.json"))
            .unwrap();
        assert_eq!(outcome, LegacyMigration::NotFound);
        assert!(store.get_all_campaigns().unwrap().is_empty());
    }

    #[test]
    fn wrapped_state_is_imported_and_cleared() {
        let store = LocalStore::in_memory();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("campaign-storage.json");
        fs::write(
            &path,
            json!({
                "state": {
                    "campaignName": "Curse of Strahd",
                    "npcs": [{"name": "Ireena"}],
                    "isSidebarOpen": true
                },
                "version": 0
            })
            .to_string(),
        )
        .unwrap();

        let outcome = store.migrate_from_legacy(&path).unwrap();
        assert_eq!(outcome, LegacyMigration::Imported);
        assert!(!path.exists());

        let current = store
            .get_campaign(crate::CURRENT_CAMPAIGN_ID)
            .unwrap()
            .unwrap();
        assert_eq!(current.name, "Curse of Strahd");
        assert_eq!(current.version, LEGACY_DATA_VERSION);
        assert_eq!(current.data["npcs"][0]["name"], "Ireena");
        assert!(current.data.get("isSidebarOpen").is_none());

        // Second run finds nothing to do
        assert_eq!(
            store.migrate_from_legacy(&path).unwrap(),
            LegacyMigration::NotFound
        );
    }

    #[test]
    fn existing_campaign_is_not_overwritten() {
        let store = LocalStore::in_memory();
        store
            .save_campaign(&CampaignRecord::current("Live", json!({"npcs": []})))
            .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(&path, json!({"npcs": [{"name": "Old"}]}).to_string()).unwrap();

        assert_eq!(
            store.migrate_from_legacy(&path).unwrap(),
            LegacyMigration::Skipped
        );
        assert!(!path.exists());

        let current = store
            .get_campaign(crate::CURRENT_CAMPAIGN_ID)
            .unwrap()
            .unwrap();
        assert_eq!(current.name, "Live");
    }

    #[test]
    fn malformed_file_is_kept() {
        let store = LocalStore::in_memory();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(&path, "{not json").unwrap();

        assert!(store.migrate_from_legacy(&path).is_err());
        assert!(path.exists());
    }
}
