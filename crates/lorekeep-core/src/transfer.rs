//! Campaign export/import bundles
//!
//! A bundle is a self-contained, pretty-printed JSON document with exactly the
//! keys `exportDate`, `version`, `campaignId`, `campaignName` and `data`. It is
//! the manual transfer format for moving a campaign between installations.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use crate::backup::{create_backup, BackupError, BackupPolicy, BackupRecord, BackupType};
use crate::campaign::{CampaignRecord, CampaignSelector, CURRENT_CAMPAIGN_ID};
use crate::storage::{LocalStore, StorageError};
use crate::sync::domains;

/// Name given to an imported campaign that carries none
const IMPORTED_CAMPAIGN_NAME: &str = "Imported Campaign";

/// Exported campaign bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    /// ISO-8601 export time
    pub export_date: String,
    /// Campaign data version
    pub version: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub data: Value,
}

/// Error type for export/import operations
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid bundle: missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid bundle: field '{0}' must be a JSON object")]
    NotAnObject(&'static str),

    #[error("Nothing to export: no campaign found")]
    NoCampaign,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),
}

/// Build a bundle from the selected campaign
///
/// # Errors
/// Returns an error if there is no campaign to export or the store fails
pub fn export_campaign(
    store: &LocalStore,
    source: &CampaignSelector,
) -> Result<ExportBundle, TransferError> {
    let campaign = source.resolve(store)?.ok_or(TransferError::NoCampaign)?;

    Ok(ExportBundle {
        export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: campaign.version,
        campaign_id: campaign.id,
        campaign_name: campaign.name,
        data: campaign.data,
    })
}

/// Export the selected campaign as pretty-printed JSON
///
/// # Errors
/// Returns an error if there is no campaign to export or the store fails
pub fn export_to_string(
    store: &LocalStore,
    source: &CampaignSelector,
) -> Result<String, TransferError> {
    let bundle = export_campaign(store, source)?;
    Ok(serde_json::to_string_pretty(&bundle)?)
}

/// Export the selected campaign to a file
///
/// # Errors
/// Returns an error if there is no campaign or the file cannot be written
pub fn export_to_file(
    store: &LocalStore,
    source: &CampaignSelector,
    output_path: &Path,
) -> Result<ExportBundle, TransferError> {
    let bundle = export_campaign(store, source)?;
    fs::write(output_path, serde_json::to_string_pretty(&bundle)?)?;
    info!(path = %output_path.display(), campaign = %bundle.campaign_name, "campaign exported");
    Ok(bundle)
}

/// Result of a successful import
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// The campaign now stored as current
    pub campaign: CampaignRecord,
    /// Id the bundle was archived under
    pub archived_as: String,
    /// Safety backup taken right after the import
    pub backup: Option<BackupRecord>,
}

/// Validate a bundle without writing anything
///
/// # Errors
/// Returns an error if the text is not JSON, lacks `data` or `version`, or
/// carries `data` that is not an object
pub fn parse_bundle(raw: &str) -> Result<ExportBundle, TransferError> {
    let value: Value = serde_json::from_str(raw)?;

    let data = match value.get("data") {
        None | Some(Value::Null) => return Err(TransferError::MissingField("data")),
        Some(data @ Value::Object(_)) => data.clone(),
        Some(_) => return Err(TransferError::NotAnObject("data")),
    };
    let version = match value.get("version") {
        Some(Value::String(v)) if !v.trim().is_empty() => v.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(TransferError::MissingField("version")),
    };

    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let campaign_id =
        text("campaignId").unwrap_or_else(|| format!("imported-{}", Utc::now().timestamp_millis()));
    let campaign_name = text("campaignName")
        .or_else(|| domains::campaign_name(&data).map(str::to_string))
        .unwrap_or_else(|| IMPORTED_CAMPAIGN_NAME.to_string());
    let export_date = text("exportDate")
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    Ok(ExportBundle {
        export_date,
        version,
        campaign_id,
        campaign_name,
        data,
    })
}

/// Import a bundle as the current campaign
///
/// The bundle is validated before anything is written, archived under its
/// own id, promoted to the current campaign, and followed by one manual
/// backup of the imported state. Live state must be rehydrated afterwards.
///
/// # Errors
/// Returns an error if the bundle is invalid or cannot be stored
pub fn import_bundle(store: &LocalStore, raw: &str) -> Result<ImportOutcome, TransferError> {
    let bundle = parse_bundle(raw)?;

    if bundle.campaign_id != CURRENT_CAMPAIGN_ID {
        let archive = CampaignRecord::new(
            bundle.campaign_id.clone(),
            bundle.campaign_name.clone(),
            bundle.data.clone(),
        )
        .with_version(bundle.version.clone());
        store.save_campaign(&archive)?;
    }

    let current = CampaignRecord::current(bundle.campaign_name.clone(), bundle.data)
        .with_version(bundle.version);
    let campaign = store.save_campaign(&current)?;

    let policy = BackupPolicy::load(store)?;
    let backup = create_backup(
        store,
        &CampaignSelector::current(),
        BackupType::Manual,
        Some(format!("Imported: {}", campaign.name)),
        policy.max_manual_backups,
    )?;

    info!(
        archived_as = %bundle.campaign_id,
        campaign = %campaign.name,
        "campaign imported"
    );

    Ok(ImportOutcome {
        campaign,
        archived_as: bundle.campaign_id,
        backup,
    })
}

/// Import a bundle file
///
/// # Errors
/// Returns an error if the file cannot be read or the bundle is invalid
pub fn import_file(store: &LocalStore, path: &Path) -> Result<ImportOutcome, TransferError> {
    let raw = fs::read_to_string(path)?;
    import_bundle(store, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_data_is_rejected_before_write() {
        let store = LocalStore::in_memory();
        let err = import_bundle(&store, r#"{"version": "2.0.0"}"#).unwrap_err();

        assert!(matches!(err, TransferError::MissingField("data")));
        assert!(store.get_all_campaigns().unwrap().is_empty());
        assert!(store.get_all_backups().unwrap().is_empty());
    }

    #[test]
    fn non_object_data_is_rejected_before_write() {
        let store = LocalStore::in_memory();

        for data in [json!([{"name": "Ireena"}]), json!(42), json!("Barovia")] {
            let raw = json!({"version": "2.0.0", "data": data}).to_string();
            let err = import_bundle(&store, &raw).unwrap_err();
            assert!(matches!(err, TransferError::NotAnObject("data")), "{data}");
        }

        assert!(store.get_all_campaigns().unwrap().is_empty());
        assert!(store.get_all_backups().unwrap().is_empty());
    }

    #[test]
    fn missing_version_is_rejected() {
        let err = parse_bundle(r#"{"data": {"npcs": []}}"#).unwrap_err();
        assert!(matches!(err, TransferError::MissingField("version")));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_bundle("{\"data\": "),
            Err(TransferError::InvalidJson(_))
        ));
    }

    #[test]
    fn absent_id_is_synthesized() {
        let bundle = parse_bundle(&json!({"version": "2.0.0", "data": {}}).to_string()).unwrap();
        assert!(bundle.campaign_id.starts_with("imported-"));
        assert_eq!(bundle.campaign_name, IMPORTED_CAMPAIGN_NAME);
    }

    #[test]
    fn export_without_campaign_fails() {
        let store = LocalStore::in_memory();
        assert!(matches!(
            export_campaign(&store, &CampaignSelector::current()),
            Err(TransferError::NoCampaign)
        ));
    }

    #[test]
    fn bundle_has_exactly_the_documented_keys() {
        let store = LocalStore::in_memory();
        store
            .save_campaign(&CampaignRecord::current("Icespire", json!({"npcs": []})))
            .unwrap();

        let text = export_to_string(&store, &CampaignSelector::current()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();

        assert_eq!(
            keys,
            vec!["campaignId", "campaignName", "data", "exportDate", "version"]
        );
        assert!(text.contains('\n'), "bundle should be pretty-printed");
    }
}
