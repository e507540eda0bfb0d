//! Object storage client
//!
//! [`ObjectStore`] is the seam between the mirror and the network;
//! [`HttpObjectStore`] implements it against the Supabase storage REST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::{CloudConfig, Session};
use crate::error::CloudError;

/// Page size for listing requests
pub const LIST_LIMIT: u32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One entry of a folder listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteObject {
    /// Name relative to the listed folder
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<ObjectMetadata>,
}

impl RemoteObject {
    #[must_use]
    pub fn size(&self) -> u64 {
        self.metadata.as_ref().and_then(|m| m.size).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default)]
    pub size: Option<u64>,
}

/// Remote object storage scoped by the caller's session
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a new object; an existing object at `path` is never overwritten
    async fn upload(&self, session: &Session, path: &str, body: Vec<u8>) -> Result<(), CloudError>;

    /// Objects in `folder`, newest first
    async fn list(&self, session: &Session, folder: &str) -> Result<Vec<RemoteObject>, CloudError>;

    async fn download(&self, session: &Session, path: &str) -> Result<Vec<u8>, CloudError>;

    async fn delete(&self, session: &Session, path: &str) -> Result<(), CloudError>;
}

/// Supabase storage over HTTP
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl HttpObjectStore {
    /// Build a client for a configured remote
    ///
    /// # Errors
    /// Returns `NotConfigured` if the URL or key is missing, or an HTTP error
    /// if the client cannot be built
    pub fn new(config: &CloudConfig) -> Result<Self, CloudError> {
        let (Some(base_url), Some(api_key)) = (config.base_url(), config.key()) else {
            return Err(CloudError::NotConfigured);
        };
        if !config.is_configured() {
            return Err(CloudError::NotConfigured);
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket)
    }

    fn authorize(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", session.access_token))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(&self, session: &Session, path: &str, body: Vec<u8>) -> Result<(), CloudError> {
        debug!(path, bytes = body.len(), "uploading object");
        let request = self
            .client
            .post(self.object_url(path))
            .header("Content-Type", "application/json")
            .header("x-upsert", "false")
            .body(body);

        ensure_success(self.authorize(request, session).send().await?).await?;
        Ok(())
    }

    async fn list(&self, session: &Session, folder: &str) -> Result<Vec<RemoteObject>, CloudError> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let mut objects = Vec::new();
        let mut offset = 0;

        // Pages are requested until one comes back short
        loop {
            debug!(folder, offset, "listing objects");
            let request = self.client.post(&url).json(&json!({
                "prefix": folder,
                "limit": LIST_LIMIT,
                "offset": offset,
                "sortBy": {"column": "created_at", "order": "desc"}
            }));

            let response = ensure_success(self.authorize(request, session).send().await?).await?;
            let page: Vec<RemoteObject> = response.json().await?;
            let full = page.len() >= LIST_LIMIT as usize;
            objects.extend(page);

            if !full {
                return Ok(objects);
            }
            offset += LIST_LIMIT;
        }
    }

    async fn download(&self, session: &Session, path: &str) -> Result<Vec<u8>, CloudError> {
        debug!(path, "downloading object");
        let request = self.client.get(format!(
            "{}/storage/v1/object/authenticated/{}/{path}",
            self.base_url, self.bucket
        ));

        let response = ensure_success(self.authorize(request, session).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn delete(&self, session: &Session, path: &str) -> Result<(), CloudError> {
        debug!(path, "deleting object");
        let request = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, self.bucket))
            .json(&json!({"prefixes": [path]}));

        ensure_success(self.authorize(request, session).send().await?).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, CloudError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CloudError::Status {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        }),
    })
}

// Supabase reports failures as {"error": "...", "message": "..."}
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
