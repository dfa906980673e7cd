/// Task service
///
/// Validation, assignment rules, filtered listings, and per-user
/// statistics for tasks. Assignee existence is checked through the
/// injected [`UserDirectory`] at write time only; nothing cascades.

use super::{required_text, text, ServiceError, ServiceResult, UserDirectory, WriteGate, NO_DATA};
use crate::models::{
    task::{
        CreateTaskRequest, NewTask, Priority, Task, TaskChanges, TaskStats, UpdateTaskRequest,
        ASSIGNEE_FIELD, COMPLETED_FIELD, PRIORITY_FIELD,
    },
    RecordId,
};
use crate::storage::Table;
use crate::validators::sanitize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

pub const TASK_NOT_FOUND: &str = "Tarea no encontrada";
pub const TITLE_REQUIRED: &str = "El título es requerido y no puede estar vacío";
pub const TITLE_EMPTY: &str = "El título no puede estar vacío";
pub const INVALID_PRIORITY: &str = "La prioridad debe ser: alta, media o baja";
pub const ASSIGNEE_MISSING: &str = "El usuario asignado no existe";

/// Tasks CRUD with priority and assignment rules
pub struct TaskService {
    tasks: Arc<dyn Table<Task>>,
    users: Arc<dyn UserDirectory>,
    gate: WriteGate,
}

fn parse_priority(raw: Option<&str>) -> ServiceResult<Priority> {
    raw.and_then(|p| p.parse().ok())
        .ok_or_else(|| ServiceError::validation(INVALID_PRIORITY))
}

/// `null` or absent means unassigned; anything that is not an id names no user
fn parse_assignee(raw: Option<&JsonValue>) -> ServiceResult<Option<RecordId>> {
    match raw {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => RecordId::from_json(value)
            .map(Some)
            .ok_or_else(|| ServiceError::validation(ASSIGNEE_MISSING)),
    }
}

fn is_true(raw: Option<&JsonValue>) -> bool {
    matches!(raw, Some(JsonValue::Bool(true)))
}

impl TaskService {
    pub fn new(tasks: Arc<dyn Table<Task>>, users: Arc<dyn UserDirectory>, gate: WriteGate) -> Self {
        Self { tasks, users, gate }
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.list().await?)
    }

    pub async fn get_by_id(&self, id: &RecordId) -> ServiceResult<Option<Task>> {
        Ok(self.tasks.get(id).await?)
    }

    /// Tasks assigned to `user_id`
    pub async fn list_by_user(&self, user_id: &RecordId) -> ServiceResult<Vec<Task>> {
        Ok(self
            .tasks
            .list_where(ASSIGNEE_FIELD, &user_id.to_json())
            .await?)
    }

    pub async fn count_by_user(&self, user_id: &RecordId) -> ServiceResult<usize> {
        Ok(self
            .tasks
            .count_where(ASSIGNEE_FIELD, &user_id.to_json())
            .await?)
    }

    pub async fn list_completed(&self) -> ServiceResult<Vec<Task>> {
        Ok(self
            .tasks
            .list_where(COMPLETED_FIELD, &JsonValue::Bool(true))
            .await?)
    }

    pub async fn list_pending(&self) -> ServiceResult<Vec<Task>> {
        Ok(self
            .tasks
            .list_where(COMPLETED_FIELD, &JsonValue::Bool(false))
            .await?)
    }

    /// Tasks with the given priority; an unknown priority yields an empty list
    pub async fn list_by_priority(&self, priority: &str) -> ServiceResult<Vec<Task>> {
        let Ok(priority) = priority.parse::<Priority>() else {
            return Ok(Vec::new());
        };

        Ok(self
            .tasks
            .list_where(PRIORITY_FIELD, &JsonValue::from(priority.as_str()))
            .await?)
    }

    async fn ensure_assignee_exists(&self, assignee: &RecordId) -> ServiceResult<()> {
        if self.users.user_exists(assignee).await? {
            Ok(())
        } else {
            Err(ServiceError::validation(ASSIGNEE_MISSING))
        }
    }

    /// Creates a task
    ///
    /// Checks run in order: no data, title, priority, assignee existence.
    /// Priority defaults to `media`, description to empty, completion to false.
    pub async fn create(&self, input: CreateTaskRequest) -> ServiceResult<Task> {
        if input.is_empty() {
            return Err(ServiceError::validation(NO_DATA));
        }

        let title = required_text(text(input.title.as_ref()), TITLE_REQUIRED)?;
        let priority = match &input.priority {
            None => Priority::default(),
            Some(raw) => parse_priority(raw.as_str())?,
        };
        let description = sanitize(text(input.description.as_ref())).unwrap_or_default();
        let assignee_id = parse_assignee(input.assignee_id.as_ref())?;

        let _guard = self.gate.enter().await;

        if let Some(assignee) = &assignee_id {
            self.ensure_assignee_exists(assignee).await?;
        }

        let task = self
            .tasks
            .insert(NewTask {
                title,
                description,
                completed: is_true(input.completed.as_ref()),
                priority,
                assignee_id,
            })
            .await?;

        info!(task_id = %task.id, priority = %task.priority, "Task created");
        Ok(task)
    }

    /// Applies a partial update
    ///
    /// All supplied fields are validated before anything is written.
    /// `usuario_id: null` unassigns; a `completada` other than `true` counts
    /// as false. A body with only unrecognised keys changes nothing.
    pub async fn update(&self, id: &RecordId, input: UpdateTaskRequest) -> ServiceResult<Task> {
        if input.is_empty() {
            return Err(ServiceError::validation(NO_DATA));
        }

        let _guard = self.gate.enter().await;

        let current = self
            .tasks
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))?;

        let mut changes = TaskChanges::default();

        if let Some(title) = &input.title {
            changes.title = Some(required_text(title.as_str(), TITLE_EMPTY)?);
        }

        if let Some(description) = &input.description {
            changes.description = Some(sanitize(description.as_str()).unwrap_or_default());
        }

        if let Some(completed) = &input.completed {
            changes.completed = Some(is_true(Some(completed)));
        }

        if let Some(priority) = &input.priority {
            changes.priority = Some(parse_priority(priority.as_str())?);
        }

        if let Some(raw) = &input.assignee_id {
            let assignee = parse_assignee(Some(raw))?;
            if let Some(user_id) = &assignee {
                self.ensure_assignee_exists(user_id).await?;
            }
            changes.assignee_id = Some(assignee);
        }

        if changes.is_empty() {
            return Ok(current);
        }

        let task = self
            .tasks
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))?;
        info!(task_id = %task.id, "Task updated");
        Ok(task)
    }

    /// Marks a task completed; calling it again is a no-op success
    pub async fn mark_completed(&self, id: &RecordId) -> ServiceResult<Task> {
        let _guard = self.gate.enter().await;

        let changes = TaskChanges {
            completed: Some(true),
            ..Default::default()
        };

        let task = self
            .tasks
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))?;
        info!(task_id = %task.id, "Task marked completed");
        Ok(task)
    }

    pub async fn delete(&self, id: &RecordId) -> ServiceResult<()> {
        let _guard = self.gate.enter().await;

        if !self.tasks.delete(id).await? {
            return Err(ServiceError::not_found(TASK_NOT_FOUND));
        }

        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Totals over the user's tasks
    ///
    /// Does not check that the user exists; an unknown user simply has no
    /// tasks and gets all zeros.
    pub async fn stats_for_user(&self, user_id: &RecordId) -> ServiceResult<TaskStats> {
        let tasks = self.list_by_user(user_id).await?;
        Ok(TaskStats::from_tasks(&tasks))
    }
}
