//! # REST API for Child Management
//!
//! Endpoints for creating, retrieving, updating, and deleting the children of
//! the signed-in parent. Children of other parents are reported as missing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use shared::{Child, CreateChildRequest, MessageResponse, UpdateChildRequest};
use tracing::info;

use super::error::{ApiError, DomainResultExt};
use super::extractors::{AuthUser, ValidJson};
use super::mappers::ChildMapper;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_children).post(create_child))
        .route("/:id", get(get_child).put(update_child).delete(delete_child))
}

/// Create a new child
pub async fn create_child(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
    ValidJson(request): ValidJson<CreateChildRequest>,
) -> Result<(StatusCode, Json<Child>), ApiError> {
    info!("POST /api/children - request: {:?}", request);

    let command = ChildMapper::to_create_command(request)?;
    let child = state
        .child_service
        .create_child(&parent.id, command)
        .await
        .or_api("Failed to create child")?;
    Ok((StatusCode::CREATED, Json(ChildMapper::to_dto(child))))
}

pub async fn list_children(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
) -> Result<Json<Vec<Child>>, ApiError> {
    info!("GET /api/children");

    let children = state
        .child_service
        .list_children(&parent.id)
        .await
        .or_api("Failed to list children")?;
    Ok(Json(children.into_iter().map(ChildMapper::to_dto).collect()))
}

pub async fn get_child(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
    Path(child_id): Path<String>,
) -> Result<Json<Child>, ApiError> {
    info!("GET /api/children/{}", child_id);

    let child = state
        .child_service
        .get_child(&parent.id, &child_id)
        .await
        .or_api("Failed to get child")?;
    Ok(Json(ChildMapper::to_dto(child)))
}

pub async fn update_child(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
    Path(child_id): Path<String>,
    ValidJson(request): ValidJson<UpdateChildRequest>,
) -> Result<Json<Child>, ApiError> {
    info!("PUT /api/children/{} - request: {:?}", child_id, request);

    let command = ChildMapper::to_update_command(request)?;
    let child = state
        .child_service
        .update_child(&parent.id, &child_id, command)
        .await
        .or_api("Failed to update child")?;
    Ok(Json(ChildMapper::to_dto(child)))
}

pub async fn delete_child(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
    Path(child_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!("DELETE /api/children/{}", child_id);

    state
        .child_service
        .delete_child(&parent.id, &child_id)
        .await
        .or_api("Failed to delete child")?;
    Ok(Json(MessageResponse::new("Child deleted")))
}
