//! Persisted backup policy

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::backup::BackupError;
use crate::storage::LocalStore;

/// Settings key holding the policy
pub const BACKUP_CONFIG_KEY: &str = "backupConfig";

/// Automatic backup schedule and retention caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupPolicy {
    /// Whether the timer runs
    pub auto_backup_enabled: bool,
    /// Minutes between automatic backups
    pub backup_interval: u64,
    /// Automatic backups kept before the oldest is evicted
    pub max_auto_backups: usize,
    /// Manual backups kept before the oldest is evicted
    pub max_manual_backups: usize,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            auto_backup_enabled: true,
            backup_interval: 30,
            max_auto_backups: 10,
            max_manual_backups: 20,
        }
    }
}

impl BackupPolicy {
    /// Timer period
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval.saturating_mul(60))
    }

    /// Reject values the scheduler cannot run with
    ///
    /// # Errors
    /// Returns an error for a zero interval or a zero cap
    pub fn validate(&self) -> Result<(), BackupError> {
        if self.backup_interval == 0 {
            return Err(BackupError::InvalidPolicy(
                "backup interval must be at least one minute".to_string(),
            ));
        }
        if self.max_auto_backups == 0 {
            return Err(BackupError::InvalidPolicy(
                "at least one automatic backup must be kept".to_string(),
            ));
        }
        if self.max_manual_backups == 0 {
            return Err(BackupError::InvalidPolicy(
                "at least one manual backup must be kept".to_string(),
            ));
        }
        Ok(())
    }

    /// Load the stored policy, falling back to defaults
    ///
    /// An unreadable or invalid stored policy is logged and replaced by the
    /// defaults rather than blocking startup.
    ///
    /// # Errors
    /// Returns an error if the settings collection cannot be read
    pub fn load(store: &LocalStore) -> Result<Self, BackupError> {
        let Some(value) = store.get_setting(BACKUP_CONFIG_KEY)? else {
            return Ok(Self::default());
        };

        match serde_json::from_value::<Self>(value) {
            Ok(policy) if policy.validate().is_ok() => Ok(policy),
            Ok(policy) => {
                warn!(?policy, "stored backup policy is invalid, using defaults");
                Ok(Self::default())
            }
            Err(e) => {
                warn!(error = %e, "stored backup policy is unreadable, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Persist the policy
    ///
    /// # Errors
    /// Returns an error if the policy is invalid or cannot be written
    pub fn save(&self, store: &LocalStore) -> Result<(), BackupError> {
        self.validate()?;
        store.set_setting(BACKUP_CONFIG_KEY, &serde_json::to_value(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let policy = BackupPolicy::default();
        assert!(policy.auto_backup_enabled);
        assert_eq!(policy.backup_interval, 30);
        assert_eq!(policy.max_auto_backups, 10);
        assert_eq!(policy.max_manual_backups, 20);
        assert_eq!(policy.interval(), Duration::from_secs(1800));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let value = serde_json::to_value(BackupPolicy::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "autoBackupEnabled": true,
                "backupInterval": 30,
                "maxAutoBackups": 10,
                "maxManualBackups": 20
            })
        );
    }

    #[test]
    fn partial_setting_fills_defaults() {
        let policy: BackupPolicy =
            serde_json::from_value(json!({"backupInterval": 5})).unwrap();
        assert_eq!(policy.backup_interval, 5);
        assert_eq!(policy.max_manual_backups, 20);
    }

    #[test]
    fn round_trips_through_settings() {
        let store = LocalStore::in_memory();
        assert_eq!(BackupPolicy::load(&store).unwrap(), BackupPolicy::default());

        let policy = BackupPolicy {
            auto_backup_enabled: false,
            backup_interval: 15,
            max_auto_backups: 3,
            max_manual_backups: 4,
        };
        policy.save(&store).unwrap();
        assert_eq!(BackupPolicy::load(&store).unwrap(), policy);
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let store = LocalStore::in_memory();
        let policy = BackupPolicy {
            backup_interval: 0,
            ..BackupPolicy::default()
        };
        assert!(matches!(policy.save(&store), Err(BackupError::InvalidPolicy(_))));
    }

    #[test]
    fn garbage_setting_loads_defaults() {
        let store = LocalStore::in_memory();
        store
            .set_setting(BACKUP_CONFIG_KEY, &json!({"backupInterval": "often"}))
            .unwrap();
        assert_eq!(BackupPolicy::load(&store).unwrap(), BackupPolicy::default());
    }
}
