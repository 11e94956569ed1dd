//! Object storage for rendered QR artifacts.
//!
//! Backends take a key, the artifact bytes and a content type, and return
//! the durable public URL of the stored object. Saving under an existing key
//! replaces the object.

pub mod credentials;
pub mod gcs;
pub mod local;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StorageBackendKind, StorageConfig};

pub use credentials::{GcsCredentials, ServiceAccountKey};
pub use gcs::GcsStorage;
pub use local::LocalStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("Storage authentication failed: {0}")]
    Auth(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `content` publicly readable under `key` and returns its URL.
    async fn save(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    match config.backend {
        StorageBackendKind::Gcs => Ok(Arc::new(GcsStorage::new(config)?)),
        StorageBackendKind::Local => Ok(Arc::new(LocalStorage::new(config)?)),
    }
}
