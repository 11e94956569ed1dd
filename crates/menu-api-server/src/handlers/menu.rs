use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::database::{Menu, MenuWithDishes};
use crate::services::MenuService;
use crate::utils::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateMenuRequest {
    #[serde(default)]
    pub nombre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMenuRequest {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateMenuResponse {
    pub id: i32,
    pub nombre: String,
    pub codigo_qr: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateMenuResponse {
    pub message: String,
    pub qr: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn menu_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid menu id: {}", e)))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// GET /menus
pub async fn list_menus(
    State(menu_service): State<Arc<MenuService>>,
) -> Result<Json<Vec<Menu>>, ApiError> {
    let menus = menu_service.list_menus().await?;
    Ok(Json(menus))
}

/// GET /menu/{id}
pub async fn get_menu(
    State(menu_service): State<Arc<MenuService>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MenuWithDishes>, ApiError> {
    let id = menu_id(path)?;
    let menu = menu_service.get_menu(id).await?;
    Ok(Json(menu))
}

/// POST /menu
pub async fn create_menu(
    State(menu_service): State<Arc<MenuService>>,
    payload: Result<Json<CreateMenuRequest>, JsonRejection>,
) -> Result<Json<CreateMenuResponse>, ApiError> {
    let request = json_body(payload)?;
    let nombre = request.nombre.unwrap_or_default();

    info!("Create menu request: {}", nombre);
    let created = menu_service.create_menu(&nombre).await?;

    Ok(Json(CreateMenuResponse {
        id: created.id,
        nombre: created.name,
        codigo_qr: created.qr_url,
    }))
}

/// PUT /menu/{id}
pub async fn update_menu(
    State(menu_service): State<Arc<MenuService>>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateMenuRequest>, JsonRejection>,
) -> Result<Json<UpdateMenuResponse>, ApiError> {
    let id = menu_id(path)?;
    let request = json_body(payload)?;
    let nombre = request.nombre.unwrap_or_default();

    info!("Update menu request for {}", id);
    let qr = menu_service
        .update_menu(id, &nombre, request.status.as_deref())
        .await?;

    Ok(Json(UpdateMenuResponse {
        message: "Menu updated and QR generated".to_string(),
        qr,
    }))
}

/// DELETE /menu/{id}
pub async fn delete_menu(
    State(menu_service): State<Arc<MenuService>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = menu_id(path)?;
    menu_service.delete_menu(id).await?;

    Ok(Json(MessageResponse {
        message: "Menu deleted".to_string(),
    }))
}
