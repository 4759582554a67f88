//! GCS JSON API client.
//!
//! Firebase Storage buckets are GCS buckets; this client speaks the JSON
//! API directly over the same tuned reqwest stack the Firestore client
//! uses. Object names are URL-encoded path segments, so folder-style keys
//! (`slate/index.json`) work as-is.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::auth::StorageAuth;
use crate::error::{StorageError, StorageResult};

/// Default GCS endpoint.
const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// Configuration for the storage client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket name (e.g. "myproject.appspot.com")
    pub bucket: String,
    /// API endpoint; overridable for tests
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let bucket = std::env::var("STORAGE_BUCKET")
            .or_else(|_| std::env::var("FIREBASE_STORAGE_BUCKET"))
            .map_err(|_| {
                StorageError::config_error(
                    "STORAGE_BUCKET or FIREBASE_STORAGE_BUCKET must be set",
                )
            })?;

        Ok(Self {
            bucket,
            base_url: std::env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(30),
        })
    }
}

/// Firebase Storage (GCS) client.
pub struct StorageClient {
    http: Client,
    config: StorageConfig,
    auth: StorageAuth,
}

impl StorageClient {
    /// Create a new client with service-account auth.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        let auth = StorageAuth::from_env()?;
        Self::with_auth(config, auth)
    }

    /// Create a client without credentials, for public buckets and tests.
    pub fn unauthenticated(config: StorageConfig) -> StorageResult<Self> {
        Self::with_auth(config, StorageAuth::Anonymous)
    }

    fn with_auth(config: StorageConfig, auth: StorageAuth) -> StorageResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("greenlight-storage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StorageError::Network)?;

        Ok(Self { http, config, auth })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(StorageConfig::from_env()?)
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.config.base_url,
            self.config.bucket,
            urlencoding::encode(key)
        )
    }

    fn upload_url(&self, key: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.config.base_url,
            self.config.bucket,
            urlencoding::encode(key)
        )
    }

    /// Download an object as bytes.
    pub async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        debug!("Downloading {}", key);
        let url = self.object_url(key);

        let mut request = self.http.get(&url);
        if let Some(token) = self.auth.bearer().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StorageError::not_found(key)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StorageError::download_failed(format!(
                    "{} returned {}: {}",
                    key, status, body
                )))
            }
        }
    }

    /// Download and JSON-decode an object.
    pub async fn download_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> StorageResult<T> {
        let bytes = self.download_bytes(key).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Upload bytes to an object key.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!("Uploading {} bytes to {}", data.len(), key);
        let url = self.upload_url(key);

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", content_type)
            .body(data);
        if let Some(token) = self.auth.bearer().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::upload_failed(format!(
                "{} returned {}: {}",
                key, status, body
            )));
        }

        info!("Uploaded {}", key);
        Ok(())
    }

    /// Upload a JSON-serializable value.
    pub async fn upload_json<T: serde::Serialize>(&self, value: &T, key: &str) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.upload_bytes(bytes, key, "application/json").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StorageConfig {
        StorageConfig {
            bucket: "test-bucket".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_object_url_encodes_folder_keys() {
        let client = StorageClient::unauthenticated(config()).unwrap();
        let url = client.object_url("slate/index.json");
        assert!(url.contains("/b/test-bucket/o/slate%2Findex.json"));
        assert!(url.ends_with("alt=media"));
    }

    #[test]
    fn test_upload_url_carries_object_name() {
        let client = StorageClient::unauthenticated(config()).unwrap();
        let url = client.upload_url("uploads/script.pdf");
        assert!(url.contains("uploadType=media"));
        assert!(url.contains("name=uploads%2Fscript.pdf"));
    }
}
