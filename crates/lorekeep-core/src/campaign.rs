//! Campaign records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{LocalStore, StorageError};

/// Reserved id of the record holding the live session
pub const CURRENT_CAMPAIGN_ID: &str = "current-campaign";

/// Version of the campaign data layout written by this build
pub const CAMPAIGN_DATA_VERSION: &str = "2.0.0";

/// Name used when a campaign carries none
pub const DEFAULT_CAMPAIGN_NAME: &str = "Current Campaign";

/// A stored campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Full campaign tree (all persisted domains)
    pub data: Value,
    /// When first created
    pub created_at: DateTime<Utc>,
    /// When last written
    pub updated_at: DateTime<Utc>,
    /// Data layout version the tree was written with
    pub version: String,
}

impl CampaignRecord {
    /// Create a record stamped with the current time and data version
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, data: Value) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            data,
            created_at: now,
            updated_at: now,
            version: CAMPAIGN_DATA_VERSION.to_string(),
        }
    }

    /// Create the live-session record
    #[must_use]
    pub fn current(name: impl Into<String>, data: Value) -> Self {
        Self::new(CURRENT_CAMPAIGN_ID, name, data)
    }

    /// Override the data version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Whether this is the live-session record
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.id == CURRENT_CAMPAIGN_ID
    }
}

/// Which campaign an operation reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignSelector {
    /// A specific campaign id
    Active(String),
    /// Whichever campaign was written most recently
    MostRecent,
}

impl CampaignSelector {
    /// Select the live-session record
    #[must_use]
    pub fn current() -> Self {
        Self::Active(CURRENT_CAMPAIGN_ID.to_string())
    }

    /// Load the selected campaign, `None` if it does not exist
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn resolve(&self, store: &LocalStore) -> Result<Option<CampaignRecord>, StorageError> {
        match self {
            Self::Active(id) => store.get_campaign(id),
            Self::MostRecent => store.latest_campaign(),
        }
    }
}

impl Default for CampaignSelector {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_camel_case() {
        let record = CampaignRecord::current("Saltmarsh", json!({"npcs": []}));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["id"], CURRENT_CAMPAIGN_ID);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(value["version"], CAMPAIGN_DATA_VERSION);
    }

    #[test]
    fn only_the_live_record_is_current() {
        assert!(CampaignRecord::current("Saltmarsh", json!({})).is_current());
        assert!(!CampaignRecord::new("imported-1", "Saltmarsh", json!({})).is_current());
    }

    #[test]
    fn default_selector_is_current() {
        assert_eq!(
            CampaignSelector::default(),
            CampaignSelector::Active(CURRENT_CAMPAIGN_ID.to_string())
        );
    }
}
