//! Google Cloud Storage backend (JSON API, single-request media upload).

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use super::credentials::GcsCredentials;
use super::{ObjectStorage, StorageError};
use crate::config::StorageConfig;

#[derive(Clone)]
pub struct GcsStorage {
    client: Client,
    api_base_url: String,
    public_base_url: String,
    bucket: String,
    credentials: Arc<GcsCredentials>,
}

impl GcsStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Config("storage.bucket must be set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let credentials = GcsCredentials::from_config(&client, config)?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            credentials: Arc::new(credentials),
        })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    fn upload_url(&self, key: &str) -> Result<Url, StorageError> {
        let base = format!("{}/upload/storage/v1/b/{}/o", self.api_base_url, self.bucket);
        Url::parse_with_params(
            &base,
            &[
                ("uploadType", "media"),
                ("name", key),
                ("predefinedAcl", "publicRead"),
            ],
        )
        .map_err(|e| StorageError::Config(format!("invalid upload url {}: {}", base, e)))
    }
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    async fn save(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = self.upload_url(key)?;
        debug!("Uploading {} ({} bytes) to bucket {}", key, content.len(), self.bucket);

        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(content);

        if let Some(token) = self.credentials.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Upload of {} rejected ({}): {}", key, status, body);
            return Err(StorageError::Rejected { status, body });
        }

        Ok(self.public_url(key))
    }
}
