//! Remote storage configuration and the signed-in session

use serde::{Deserialize, Serialize};

/// Bucket used when none is configured
pub const DEFAULT_BUCKET: &str = "campaign-backups";

/// Where remote backups live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            bucket: default_bucket(),
        }
    }
}

impl CloudConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            api_key: Some(api_key.into()),
            bucket: default_bucket(),
        }
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Service URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        non_blank(self.url.as_deref()).map(|url| url.trim_end_matches('/'))
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    /// A URL, a key and a bucket are all present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url().is_some() && self.key().is_some() && !self.bucket.trim().is_empty()
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }

    /// A session with a blank user or token counts as signed out
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.access_token.trim().is_empty()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_not_configured() {
        assert!(!CloudConfig::default().is_configured());
        assert!(!CloudConfig::new("https://x.supabase.co", "  ").is_configured());
        assert!(!CloudConfig::new("", "key").is_configured());
        assert!(CloudConfig::new("https://x.supabase.co/", "key").is_configured());
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = CloudConfig::new("https://x.supabase.co/", "key");
        assert_eq!(config.base_url(), Some("https://x.supabase.co"));
        assert_eq!(config.bucket, DEFAULT_BUCKET);
    }

    #[test]
    fn bucket_defaults_when_missing_from_toml_like_input() {
        let config: CloudConfig =
            serde_json::from_str(r#"{"url": "https://x", "api_key": "k"}"#).unwrap();
        assert_eq!(config.bucket, DEFAULT_BUCKET);
    }
}
