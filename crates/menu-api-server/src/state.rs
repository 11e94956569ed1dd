use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;

use crate::services::MenuService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub menu_service: Arc<MenuService>,
    /// Directory served under `/artifacts` (local storage backend only).
    pub artifact_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(menu_service: Arc<MenuService>) -> Self {
        Self {
            menu_service,
            artifact_dir: None,
        }
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }
}

impl FromRef<AppState> for Arc<MenuService> {
    fn from_ref(state: &AppState) -> Self {
        state.menu_service.clone()
    }
}
