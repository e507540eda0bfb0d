//! Error types for cloud operations

use lorekeep_core::StorageError;
use thiserror::Error;

/// Errors raised while talking to remote storage
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Cloud storage is not configured")]
    NotConfigured,

    #[error("You must be signed in to use cloud backups")]
    NotAuthenticated,

    #[error("No campaign data to upload")]
    NoCampaign,

    #[error("Invalid backup path: {0}")]
    InvalidPath(String),

    #[error("Backup {0} does not hold campaign data")]
    InvalidBackup(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CloudError {
    /// Whether the error was raised before any network call
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured | Self::NotAuthenticated | Self::NoCampaign | Self::InvalidPath(_)
        )
    }
}
