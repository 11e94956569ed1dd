pub mod artifact_sync;
pub mod menu_service;
pub mod qr_renderer;

pub use artifact_sync::{ArtifactError, ArtifactSync, SyncError, SyncStep};
pub use menu_service::{CreatedMenu, MenuService};
pub use qr_renderer::QrRenderer;
