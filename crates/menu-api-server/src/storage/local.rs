//! Local file system backend, for running without cloud credentials.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use super::{ObjectStorage, StorageError};
use crate::config::StorageConfig;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let root = config.local_root.as_deref().ok_or_else(|| {
            StorageError::Config("storage.local_root is required for the local backend".to_string())
        })?;

        let base_path = PathBuf::from(root);
        if base_path.exists() && !base_path.is_dir() {
            return Err(StorageError::Config(format!(
                "Base path is not a directory: {}",
                base_path.display()
            )));
        }

        Ok(Self {
            base_path,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn save(
        &self,
        key: &str,
        content: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        fs::create_dir_all(&self.base_path).await?;

        let path = self.base_path.join(key);
        fs::write(&path, content).await?;
        debug!("Wrote artifact {}", path.display());

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
