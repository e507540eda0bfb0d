//! Backup record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What created a backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    /// Created by the scheduler timer
    Auto,
    /// Created by an explicit user action
    Manual,
}

impl BackupType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown backup type: {other}")),
        }
    }
}

/// Snapshot embedded in a backup
///
/// Backups written by early builds only carried `data`; the other fields are
/// synthesized on restore when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A stored snapshot of one campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    /// `"{type}-{unix millis}-{suffix}"`
    pub id: String,
    /// Display name
    pub name: String,
    /// Embedded snapshot
    pub data: BackupPayload,
    /// When captured
    pub created_at: DateTime<Utc>,
    /// What created it
    #[serde(rename = "type")]
    pub backup_type: BackupType,
    /// Serialized payload length in bytes
    pub size: u64,
}

impl BackupRecord {
    /// Build a record around a payload, computing its size and id
    ///
    /// # Errors
    /// Returns an error if the payload cannot be serialized
    pub fn new(
        backup_type: BackupType,
        name: Option<String>,
        payload: BackupPayload,
    ) -> Result<Self, serde_json::Error> {
        let created_at = Utc::now();
        let size = serde_json::to_vec(&payload)?.len() as u64;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(backup_type, created_at));

        Ok(Self {
            id: backup_id(backup_type, created_at),
            name,
            data: payload,
            created_at,
            backup_type,
            size,
        })
    }
}

/// Unique id combining the type prefix and the creation time
fn backup_id(backup_type: BackupType, created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        backup_type,
        created_at.timestamp_millis(),
        &suffix[..8]
    )
}

fn default_name(backup_type: BackupType, created_at: DateTime<Utc>) -> String {
    let stamp = created_at.format("%Y-%m-%d %H:%M:%S");
    match backup_type {
        BackupType::Auto => format!("Auto Backup {stamp}"),
        BackupType::Manual => format!("Manual Backup {stamp}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> BackupPayload {
        BackupPayload {
            campaign_id: Some("current-campaign".to_string()),
            campaign_name: Some("Saltmarsh".to_string()),
            data: json!({"npcs": [{"name": "Eliander"}]}),
            version: Some("2.0.0".to_string()),
        }
    }

    #[test]
    fn id_carries_type_prefix() {
        let auto = BackupRecord::new(BackupType::Auto, None, payload()).unwrap();
        let manual = BackupRecord::new(BackupType::Manual, None, payload()).unwrap();

        assert!(auto.id.starts_with("auto-"));
        assert!(manual.id.starts_with("manual-"));
        assert_ne!(auto.id, manual.id);
    }

    #[test]
    fn size_is_serialized_payload_length() {
        let record = BackupRecord::new(BackupType::Manual, None, payload()).unwrap();
        let expected = serde_json::to_vec(&payload()).unwrap().len() as u64;
        assert_eq!(record.size, expected);
    }

    #[test]
    fn blank_name_falls_back_to_default() {
        let record =
            BackupRecord::new(BackupType::Manual, Some("   ".to_string()), payload()).unwrap();
        assert!(record.name.starts_with("Manual Backup "));

        let named =
            BackupRecord::new(BackupType::Manual, Some("Before the heist".to_string()), payload())
                .unwrap();
        assert_eq!(named.name, "Before the heist");
    }

    #[test]
    fn legacy_payload_without_metadata_parses() {
        let payload: BackupPayload = serde_json::from_value(json!({"data": {"quests": []}})).unwrap();
        assert!(payload.campaign_id.is_none());
        assert!(payload.version.is_none());
    }

    #[test]
    fn type_serializes_lowercase() {
        let record = BackupRecord::new(BackupType::Auto, None, payload()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "auto");
        assert!(value.get("createdAt").is_some());
    }
}
