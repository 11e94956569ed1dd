use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::services::MenuService;
use crate::utils::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

pub async fn readiness_check(
    State(menu_service): State<Arc<MenuService>>,
) -> Result<StatusCode, ApiError> {
    menu_service.ping().await?;
    Ok(StatusCode::OK)
}
