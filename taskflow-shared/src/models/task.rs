/// Task model
///
/// A task may be assigned to a user through `usuario_id`. The reference is
/// non-owning: it is checked when written, and a user cannot be deleted
/// while any task still points at it.
///
/// # Completion
///
/// ```text
/// pending ⇄ completed
/// ```
///
/// `mark_completed` or an update with `completada: true` moves a task to
/// completed; only an update with `completada: false` moves it back.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     titulo TEXT NOT NULL,
///     descripcion TEXT NOT NULL DEFAULT '',
///     completada BOOLEAN NOT NULL DEFAULT FALSE,
///     prioridad TEXT NOT NULL DEFAULT 'media',
///     usuario_id BIGINT REFERENCES users(id)
/// );
/// ```

use super::{present, RecordId};
use crate::storage::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Field holding the assignee reference in the key-value form
pub const ASSIGNEE_FIELD: &str = "usuario_id";

/// Field holding the completion flag in the key-value form
pub const COMPLETED_FIELD: &str = "completada";

/// Field holding the priority in the key-value form
pub const PRIORITY_FIELD: &str = "prioridad";

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "alta", alias = "high")]
    High,

    #[default]
    #[serde(rename = "media", alias = "medium")]
    Medium,

    #[serde(rename = "baja", alias = "low")]
    Low,
}

impl Priority {
    /// Stored (lowercase) representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "alta",
            Priority::Medium => "media",
            Priority::Low => "baja",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alta" | "high" => Ok(Priority::High),
            "media" | "medium" => Ok(Priority::Medium),
            "baja" | "low" => Ok(Priority::Low),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}

/// Stored task record, also the view returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by storage
    pub id: RecordId,

    /// Title (trimmed, never blank)
    #[serde(rename = "titulo")]
    pub title: String,

    /// Free-form description, may be empty
    #[serde(rename = "descripcion", default)]
    pub description: String,

    #[serde(rename = "completada", default)]
    pub completed: bool,

    #[serde(rename = "prioridad", default)]
    pub priority: Priority,

    /// Assigned user, if any
    #[serde(rename = "usuario_id", default)]
    pub assignee_id: Option<RecordId>,
}

/// Validated data for inserting a task
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "completada")]
    pub completed: bool,
    #[serde(rename = "prioridad")]
    pub priority: Priority,
    #[serde(rename = "usuario_id")]
    pub assignee_id: Option<RecordId>,
}

/// Validated partial update
///
/// `assignee_id: Some(None)` clears the assignment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskChanges {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "completada", skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    #[serde(rename = "prioridad", skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(rename = "usuario_id", skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<RecordId>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
    }
}

/// Raw create-task request body
///
/// Fields hold the JSON exactly as sent; the service decides what is
/// acceptable. A key sent as `null` is `Some(JsonValue::Null)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(rename = "titulo", default, deserialize_with = "present")]
    pub title: Option<JsonValue>,

    #[serde(rename = "descripcion", default, deserialize_with = "present")]
    pub description: Option<JsonValue>,

    /// Anything but `true` counts as false
    #[serde(rename = "completada", default, deserialize_with = "present")]
    pub completed: Option<JsonValue>,

    /// Defaults to `media` when omitted
    #[serde(rename = "prioridad", default, deserialize_with = "present")]
    pub priority: Option<JsonValue>,

    /// `null` or omitted leaves the task unassigned
    #[serde(rename = "usuario_id", default, deserialize_with = "present")]
    pub assignee_id: Option<JsonValue>,

    /// Unrecognised keys
    #[serde(flatten)]
    pub other: JsonMap<String, JsonValue>,
}

impl CreateTaskRequest {
    /// True when the body carried no keys at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
            && self.other.is_empty()
    }
}

/// Raw update-task request body
///
/// `None` means "leave unchanged". `usuario_id: null` unassigns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(rename = "titulo", default, deserialize_with = "present")]
    pub title: Option<JsonValue>,

    #[serde(rename = "descripcion", default, deserialize_with = "present")]
    pub description: Option<JsonValue>,

    #[serde(rename = "completada", default, deserialize_with = "present")]
    pub completed: Option<JsonValue>,

    #[serde(rename = "prioridad", default, deserialize_with = "present")]
    pub priority: Option<JsonValue>,

    #[serde(rename = "usuario_id", default, deserialize_with = "present")]
    pub assignee_id: Option<JsonValue>,

    /// Unrecognised keys
    #[serde(flatten)]
    pub other: JsonMap<String, JsonValue>,
}

impl UpdateTaskRequest {
    /// True when the body carried no keys at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
            && self.other.is_empty()
    }
}

/// Task counts per priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    #[serde(rename = "alta")]
    pub high: usize,
    #[serde(rename = "media")]
    pub medium: usize,
    #[serde(rename = "baja")]
    pub low: usize,
}

/// Aggregate statistics over one user's tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    #[serde(rename = "completadas")]
    pub completed: usize,
    #[serde(rename = "pendientes")]
    pub pending: usize,
    #[serde(rename = "por_prioridad")]
    pub by_priority: PriorityBreakdown,
}

impl TaskStats {
    /// Tallies a set of tasks
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut stats = TaskStats::default();
        for task in tasks {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            }
            match task.priority {
                Priority::High => stats.by_priority.high += 1,
                Priority::Medium => stats.by_priority.medium += 1,
                Priority::Low => stats.by_priority.low += 1,
            }
        }
        stats.pending = stats.total - stats.completed;
        stats
    }
}

impl Record for Task {
    const TABLE: &'static str = "tasks";

    type Draft = NewTask;
    type Patch = TaskChanges;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewTask) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            completed: draft.completed,
            priority: draft.priority,
            assignee_id: draft.assignee_id,
        }
    }

    fn apply(&mut self, patch: TaskChanges) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.assignee_id = assignee_id;
        }
    }
}
