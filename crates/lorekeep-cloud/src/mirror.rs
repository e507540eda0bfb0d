//! Cloud mirror of the current campaign
//!
//! Uploads go to the signed-in user's folder and are never overwritten.
//! Restoring a remote backup replaces the local current campaign outright;
//! there is no merge between local and remote copies.

use chrono::{DateTime, Utc};
use lorekeep_core::campaign::DEFAULT_CAMPAIGN_NAME;
use lorekeep_core::storage::legacy::LEGACY_DATA_VERSION;
use lorekeep_core::sync::domains;
use lorekeep_core::{CampaignRecord, LocalStore, CURRENT_CAMPAIGN_ID};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{CloudConfig, Session};
use crate::error::CloudError;
use crate::naming;
use crate::response::CloudResponse;
use crate::store::{HttpObjectStore, ObjectStore, RemoteObject};

/// A remote backup as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudBackupMetadata {
    /// Human label
    pub name: String,
    /// Object path in the user's folder
    pub file_name: String,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl CloudBackupMetadata {
    fn from_object(user_id: &str, object: &RemoteObject) -> Self {
        Self {
            name: naming::display_label(&object.name),
            file_name: naming::object_path(user_id, &object.name),
            size: object.size(),
            created_at: object.created_at,
            last_modified: object.updated_at.or(object.created_at),
        }
    }
}

/// Mirrors campaign backups to remote storage
#[derive(Clone)]
pub struct CloudMirror {
    store: LocalStore,
    remote: Option<Arc<dyn ObjectStore>>,
    session: Option<Session>,
}

impl CloudMirror {
    /// Mirror over an explicit object store
    #[must_use]
    pub fn new(
        store: LocalStore,
        remote: Option<Arc<dyn ObjectStore>>,
        session: Option<Session>,
    ) -> Self {
        Self {
            store,
            remote,
            session,
        }
    }

    /// Mirror over the HTTP store described by `config`
    ///
    /// An unconfigured remote is not an error here; every operation reports
    /// it instead.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn from_config(
        store: LocalStore,
        config: &CloudConfig,
        session: Option<Session>,
    ) -> Result<Self, CloudError> {
        let remote: Option<Arc<dyn ObjectStore>> = if config.is_configured() {
            Some(Arc::new(HttpObjectStore::new(config)?))
        } else {
            None
        };
        Ok(Self::new(store, remote, session))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.remote.is_some()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_valid)
    }

    /// Upload the current campaign's data
    pub async fn upload(&self, label: Option<&str>) -> CloudResponse<CloudBackupMetadata> {
        report("upload", self.try_upload(label).await)
    }

    /// Remote backups of the signed-in user, newest first
    pub async fn list(&self) -> CloudResponse<Vec<CloudBackupMetadata>> {
        report("list", self.try_list().await)
    }

    /// Fetch and parse one remote backup
    pub async fn download(&self, file_name: &str) -> CloudResponse<Value> {
        report("download", self.try_download(file_name).await)
    }

    /// Replace the local current campaign with a remote backup
    ///
    /// Live state is not touched; the caller must rehydrate.
    pub async fn restore(&self, file_name: &str) -> CloudResponse<CampaignRecord> {
        report("restore", self.try_restore(file_name).await)
    }

    /// Delete one remote backup; local records are untouched
    pub async fn delete(&self, file_name: &str) -> CloudResponse<()> {
        report("delete", self.try_delete(file_name).await)
    }

    /// Save a remote backup to a local file
    pub async fn export_to_file(&self, file_name: &str, dest: &Path) -> CloudResponse<PathBuf> {
        report("export", self.try_export_to_file(file_name, dest).await)
    }

    fn ready(&self) -> Result<(&dyn ObjectStore, &Session), CloudError> {
        let remote = self.remote.as_deref().ok_or(CloudError::NotConfigured)?;
        let session = self
            .session
            .as_ref()
            .filter(|s| s.is_valid())
            .ok_or(CloudError::NotAuthenticated)?;
        Ok((remote, session))
    }

    async fn try_upload(&self, label: Option<&str>) -> Result<CloudBackupMetadata, CloudError> {
        let (remote, session) = self.ready()?;

        let campaign = self
            .store
            .get_campaign(CURRENT_CAMPAIGN_ID)?
            .filter(|c| !c.data.is_null())
            .ok_or(CloudError::NoCampaign)?;

        let now = Utc::now();
        let file_name = naming::backup_file_name(now, label);
        let path = naming::object_path(&session.user_id, &file_name);
        let body = serde_json::to_vec_pretty(&campaign.data)?;
        let size = body.len() as u64;

        remote.upload(session, &path, body).await?;
        info!(path = %path, size, "campaign uploaded");

        Ok(CloudBackupMetadata {
            name: naming::display_label(&file_name),
            file_name: path,
            size,
            created_at: Some(now),
            last_modified: Some(now),
        })
    }

    async fn try_list(&self) -> Result<Vec<CloudBackupMetadata>, CloudError> {
        let (remote, session) = self.ready()?;

        let objects = remote.list(session, &session.user_id).await?;
        let mut backups: Vec<_> = objects
            .iter()
            .filter(|object| object.name.ends_with(naming::FILE_EXTENSION))
            .map(|object| CloudBackupMetadata::from_object(&session.user_id, object))
            .collect();

        // Entries without a creation time sort last
        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    async fn try_download(&self, file_name: &str) -> Result<Value, CloudError> {
        let (remote, session) = self.ready()?;
        let path = scoped_path(session, file_name)?;

        let bytes = remote.download(session, &path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn try_restore(&self, file_name: &str) -> Result<CampaignRecord, CloudError> {
        let data = self.try_download(file_name).await?;
        if !data.is_object() {
            return Err(CloudError::InvalidBackup(file_name.to_string()));
        }

        let name = domains::campaign_name(&data)
            .unwrap_or(DEFAULT_CAMPAIGN_NAME)
            .to_string();
        // Remote objects carry no data version; hydration brings them up to date
        let record = CampaignRecord::current(name, data).with_version(LEGACY_DATA_VERSION);
        if let Some(existing) = self.store.get_campaign(CURRENT_CAMPAIGN_ID)? {
            warn!(
                replaced_updated_at = %existing.updated_at,
                "overwriting local campaign with remote backup"
            );
        }

        let saved = self.store.save_campaign(&record)?;
        info!(file = file_name, "campaign restored from cloud");
        Ok(saved)
    }

    async fn try_delete(&self, file_name: &str) -> Result<(), CloudError> {
        let (remote, session) = self.ready()?;
        let path = scoped_path(session, file_name)?;

        remote.delete(session, &path).await?;
        info!(path = %path, "cloud backup deleted");
        Ok(())
    }

    async fn try_export_to_file(&self, file_name: &str, dest: &Path) -> Result<PathBuf, CloudError> {
        let (remote, session) = self.ready()?;
        let path = scoped_path(session, file_name)?;

        let bytes = remote.download(session, &path).await?;
        let dest = dest.to_path_buf();
        let written = tokio::task::spawn_blocking(move || persist_atomically(&dest, &bytes))
            .await
            .map_err(|e| CloudError::Io(std::io::Error::other(e)))??;

        info!(path = %written.display(), "cloud backup exported");
        Ok(written)
    }
}

/// Resolve a file name to a path inside the user's folder
///
/// Accepts either a bare file name or a path already in the user's folder.
fn scoped_path(session: &Session, file_name: &str) -> Result<String, CloudError> {
    let prefix = format!("{}/", session.user_id);
    let bare = file_name.strip_prefix(&prefix).unwrap_or(file_name);

    if bare.is_empty() || bare.contains('/') || bare.contains("..") {
        return Err(CloudError::InvalidPath(file_name.to_string()));
    }
    Ok(naming::object_path(&session.user_id, bare))
}

fn persist_atomically(dest: &Path, bytes: &[u8]) -> Result<PathBuf, CloudError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(dest).map_err(|e| CloudError::Io(e.error))?;

    Ok(dest.to_path_buf())
}

fn report<T>(operation: &str, result: Result<T, CloudError>) -> CloudResponse<T> {
    if let Err(e) = &result {
        if e.is_precondition() {
            info!(operation, error = %e, "cloud operation skipped");
        } else {
            warn!(operation, error = %e, "cloud operation failed");
        }
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_path_accepts_bare_and_prefixed_names() {
        let session = Session::new("u1", "token");
        assert_eq!(scoped_path(&session, "a.json").unwrap(), "u1/a.json");
        assert_eq!(scoped_path(&session, "u1/a.json").unwrap(), "u1/a.json");
    }

    #[test]
    fn scoped_path_rejects_other_folders() {
        let session = Session::new("u1", "token");
        assert!(scoped_path(&session, "u2/a.json").is_err());
        assert!(scoped_path(&session, "../a.json").is_err());
        assert!(scoped_path(&session, "").is_err());
    }

    #[test]
    fn persist_writes_destination() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dest = temp_dir.path().join("out").join("backup.json");

        persist_atomically(&dest, b"{\"npcs\": []}").unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "{\"npcs\": []}");
        assert_eq!(std::fs::read_dir(dest.parent().unwrap()).unwrap().count(), 1);
    }
}
