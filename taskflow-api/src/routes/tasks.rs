/// Task endpoints
///
/// ```text
/// GET    /api/tasks[?completada=true|false][?prioridad=alta|media|baja]
/// POST   /api/tasks
/// GET    /api/tasks/completed
/// GET    /api/tasks/pending
/// GET    /api/tasks/:id
/// PUT    /api/tasks/:id
/// DELETE /api/tasks/:id
/// PATCH  /api/tasks/:id/complete
/// ```
///
/// # Request Body
///
/// ```json
/// {
///   "titulo": "Implementar API REST",
///   "descripcion": "Endpoints de usuarios y tareas",
///   "prioridad": "alta",
///   "completada": false,
///   "usuario_id": 1
/// }
/// ```

use super::{parse_id, MessageResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::JsonBody,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskflow_shared::models::task::{CreateTaskRequest, Task, UpdateTaskRequest};
use taskflow_shared::models::RecordId;
use taskflow_shared::services::task::TASK_NOT_FOUND;

fn task_id(raw: &str) -> ApiResult<RecordId> {
    parse_id(raw, TASK_NOT_FOUND)
}

/// Query filters for `GET /api/tasks`
#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    /// `true` (any case) lists completed tasks; any other value lists pending
    pub completada: Option<String>,

    /// Ignored when `completada` is present
    pub prioridad: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = &state.services.tasks;

    let list = match (filter.completada, filter.prioridad) {
        (Some(completed), _) if completed.eq_ignore_ascii_case("true") => {
            tasks.list_completed().await?
        }
        (Some(_), _) => tasks.list_pending().await?,
        (None, Some(priority)) if !priority.is_empty() => tasks.list_by_priority(&priority).await?,
        _ => tasks.list_all().await?,
    };

    Ok(Json(list))
}

pub async fn list_completed(State(state): State<AppState>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.services.tasks.list_completed().await?))
}

pub async fn list_pending(State(state): State<AppState>) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.services.tasks.list_pending().await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = task_id(&raw_id)?;
    state
        .services
        .tasks
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))
}

pub async fn create_task(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.services.tasks.create(req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(req): JsonBody<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let id = task_id(&raw_id)?;
    Ok(Json(state.services.tasks.update(&id, req).await?))
}

/// Marks a task completed; repeating the call succeeds
pub async fn complete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = task_id(&raw_id)?;
    Ok(Json(state.services.tasks.mark_completed(&id).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = task_id(&raw_id)?;
    state.services.tasks.delete(&id).await?;
    Ok(Json(MessageResponse::new("Tarea eliminada exitosamente")))
}
