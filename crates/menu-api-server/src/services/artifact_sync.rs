//! QR artifact generation and publishing.
//!
//! A menu's QR code always encodes `<public base>/menu/<id>` and is stored
//! under the key `menu_<id>.png`. Both depend only on the immutable id, so a
//! re-sync overwrites the previous artifact with identical bytes and can be
//! replayed safely after any partial failure. Writing the returned URL back
//! into the menu row is the caller's job.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::qr_renderer::{QrRenderer, PNG_CONTENT_TYPE};
use crate::config::QrConfig;
use crate::storage::{ObjectStorage, StorageError};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("QR encoding failed: {0}")]
    Encoding(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    Render,
    Publish,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStep::Render => write!(f, "render"),
            SyncStep::Publish => write!(f, "publish"),
        }
    }
}

/// Failure of `sync_for_menu`, carrying the first step that failed.
#[derive(Error, Debug)]
#[error("QR sync for menu {menu_id} failed at {step}: {source}")]
pub struct SyncError {
    pub menu_id: i32,
    pub step: SyncStep,
    pub source: ArtifactError,
}

pub struct ArtifactSync {
    public_base_url: String,
    renderer: QrRenderer,
    storage: Arc<dyn ObjectStorage>,
    step_timeout: Duration,
}

impl ArtifactSync {
    pub fn new(
        public_base_url: &str,
        renderer: QrRenderer,
        storage: Arc<dyn ObjectStorage>,
        step_timeout: Duration,
    ) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            renderer,
            storage,
            step_timeout,
        }
    }

    pub fn from_config(
        config: &QrConfig,
        storage: Arc<dyn ObjectStorage>,
    ) -> Result<Self, ArtifactError> {
        Ok(Self::new(
            &config.public_base_url,
            QrRenderer::from_config(config)?,
            storage,
            Duration::from_secs(config.step_timeout_seconds),
        ))
    }

    pub fn canonical_url(&self, id: i32) -> String {
        format!("{}/menu/{}", self.public_base_url, id)
    }

    pub fn artifact_key(id: i32) -> String {
        format!("menu_{}.png", id)
    }

    pub fn render_qr(&self, payload: &str) -> Result<Vec<u8>, ArtifactError> {
        self.renderer.render(payload)
    }

    /// Uploads under the menu's deterministic key, replacing any previous artifact.
    pub async fn publish(&self, id: i32, image: Vec<u8>) -> Result<String, ArtifactError> {
        let key = Self::artifact_key(id);
        debug!("Publishing {} ({} bytes)", key, image.len());

        match timeout(
            self.step_timeout,
            self.storage.save(&key, image, PNG_CONTENT_TYPE),
        )
        .await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(ArtifactError::Timeout(self.step_timeout)),
        }
    }

    /// Renders and publishes the QR code for `id`, returning its durable URL.
    /// Nothing is rolled back on failure and no step is retried.
    pub async fn sync_for_menu(&self, id: i32) -> Result<String, SyncError> {
        let payload = self.canonical_url(id);
        debug!("Rendering QR for menu {}: {}", id, payload);

        let image = self.render_bounded(payload).await.map_err(|source| {
            warn!("QR render failed for menu {}: {}", id, source);
            SyncError {
                menu_id: id,
                step: SyncStep::Render,
                source,
            }
        })?;

        let url = self.publish(id, image).await.map_err(|source| {
            warn!("QR publish failed for menu {}: {}", id, source);
            SyncError {
                menu_id: id,
                step: SyncStep::Publish,
                source,
            }
        })?;

        info!(menu_id = id, key = %Self::artifact_key(id), "QR artifact synced");
        Ok(url)
    }

    async fn render_bounded(&self, payload: String) -> Result<Vec<u8>, ArtifactError> {
        let renderer = self.renderer.clone();
        let task = tokio::task::spawn_blocking(move || renderer.render(&payload));

        match timeout(self.step_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ArtifactError::Encoding(join_error.to_string())),
            Err(_) => Err(ArtifactError::Timeout(self.step_timeout)),
        }
    }
}
