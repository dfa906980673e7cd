/// User endpoints
///
/// ```text
/// GET    /api/users
/// POST   /api/users
/// GET    /api/users/:id
/// PUT    /api/users/:id
/// DELETE /api/users/:id
/// GET    /api/users/:id/tasks
/// GET    /api/users/:id/stats
/// ```
///
/// # Request Body
///
/// ```json
/// { "nombre": "Ana", "email": "ana@x.com", "rol": "usuario" }
/// ```
///
/// `rol` is optional on create and defaults to `usuario`. Updates accept
/// any subset of the fields.

use super::{parse_id, MessageResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::JsonBody,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use taskflow_shared::models::task::{Task, TaskStats};
use taskflow_shared::models::user::{CreateUserRequest, UpdateUserRequest, User};
use taskflow_shared::models::RecordId;
use taskflow_shared::services::user::USER_NOT_FOUND;

fn user_id(raw: &str) -> ApiResult<RecordId> {
    parse_id(raw, USER_NOT_FOUND)
}

/// Looks the user up and fails with 404 when missing
async fn require_user(state: &AppState, id: &RecordId) -> ApiResult<()> {
    if state.services.users.exists(id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound(USER_NOT_FOUND.to_string()))
    }
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.services.users.list_all().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<User>> {
    let id = user_id(&raw_id)?;
    state
        .services
        .users
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.services.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let id = user_id(&raw_id)?;
    Ok(Json(state.services.users.update(&id, req).await?))
}

/// Deletes a user; refused with 400 while tasks are still assigned
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = user_id(&raw_id)?;
    state.services.users.delete(&id).await?;
    Ok(Json(MessageResponse::new("Usuario eliminado exitosamente")))
}

pub async fn list_user_tasks(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    let id = user_id(&raw_id)?;
    require_user(&state, &id).await?;
    Ok(Json(state.services.tasks.list_by_user(&id).await?))
}

/// Task totals for one user
///
/// ```json
/// { "total": 2, "completadas": 1, "pendientes": 1,
///   "por_prioridad": { "alta": 1, "media": 0, "baja": 1 } }
/// ```
pub async fn user_stats(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<TaskStats>> {
    let id = user_id(&raw_id)?;
    require_user(&state, &id).await?;
    Ok(Json(state.services.tasks.stats_for_user(&id).await?))
}
