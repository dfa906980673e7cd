/// User and task services
///
/// The services own all validation and referential-integrity rules. They
/// never panic on bad input; every expected failure comes back as a
/// [`ServiceError`] carrying the user-facing message.
///
/// # Wiring
///
/// ```text
/// TaskService ──UserDirectory──▶ UserService        (does this assignee exist?)
/// UserService ──AssignmentCounter──▶ TaskAssignments (how many tasks point here?)
///                                         └─ tasks table
/// ```
///
/// `TaskAssignments` reads the tasks table directly, so there is no
/// reference cycle between the two services. Both checks are read-only.
///
/// Every mutating call holds a shared [`WriteGate`] for its whole
/// check-then-write sequence, so two requests can never both pass an
/// email-uniqueness or has-tasks check before either one writes.
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::models::user::CreateUserRequest;
/// use taskflow_shared::services::Services;
/// use taskflow_shared::storage::Storage;
///
/// # async fn example() -> Result<(), taskflow_shared::services::ServiceError> {
/// let services = Services::new(&Storage::memory());
/// let ana = services
///     .users
///     .create(CreateUserRequest {
///         name: Some("Ana".into()),
///         email: Some("ana@x.com".into()),
///         ..Default::default()
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod user;

pub use task::TaskService;
pub use user::UserService;

use crate::models::{task::{Task, ASSIGNEE_FIELD}, RecordId};
use crate::storage::{Storage, StorageError, Table};
use crate::validators::{is_nonempty_string, sanitize};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

/// Returned when a create/update request carries no fields at all
pub const NO_DATA: &str = "No se enviaron datos";

/// Service errors
///
/// The `Display` form of every variant except `Unavailable` is exactly the
/// message shown to API clients.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Unknown id
    #[error("{0}")]
    NotFound(String),

    /// Duplicate email, or a delete blocked by dependents
    #[error("{0}")]
    Conflict(String),

    /// Storage could not be reached or answered nonsense
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] StorageError),
}

impl ServiceError {
    pub(crate) fn validation(message: &str) -> Self {
        ServiceError::Validation(message.to_string())
    }

    pub(crate) fn not_found(message: &str) -> Self {
        ServiceError::NotFound(message.to_string())
    }

    pub(crate) fn conflict(message: &str) -> Self {
        ServiceError::Conflict(message.to_string())
    }
}

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Serializes mutating service calls
#[derive(Clone, Default)]
pub struct WriteGate(Arc<Mutex<()>>);

impl WriteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive write access; released when the guard drops
    pub async fn enter(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Answers "does this user exist?" for assignee checks
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, id: &RecordId) -> ServiceResult<bool>;
}

/// Answers "how many tasks reference this user?" for delete checks
#[async_trait]
pub trait AssignmentCounter: Send + Sync {
    async fn count_assigned(&self, user_id: &RecordId) -> ServiceResult<usize>;
}

/// Task counts read straight from the tasks table
pub struct TaskAssignments {
    tasks: Arc<dyn Table<Task>>,
}

impl TaskAssignments {
    pub fn new(tasks: Arc<dyn Table<Task>>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl AssignmentCounter for TaskAssignments {
    async fn count_assigned(&self, user_id: &RecordId) -> ServiceResult<usize> {
        Ok(self
            .tasks
            .count_where(ASSIGNEE_FIELD, &user_id.to_json())
            .await?)
    }
}

/// The string inside a raw request field; any other JSON type reads as absent
pub(crate) fn text(field: Option<&JsonValue>) -> Option<&str> {
    field.and_then(JsonValue::as_str)
}

/// Trims `raw` and rejects it with `message` if nothing is left
pub(crate) fn required_text(raw: Option<&str>, message: &str) -> ServiceResult<String> {
    match sanitize(raw) {
        Some(text) if is_nonempty_string(Some(&text)) => Ok(text),
        _ => Err(ServiceError::validation(message)),
    }
}

/// Composition root: both services wired over one storage
#[derive(Clone)]
pub struct Services {
    pub users: Arc<UserService>,
    pub tasks: Arc<TaskService>,
}

impl Services {
    pub fn new(storage: &Storage) -> Self {
        let gate = WriteGate::new();

        let assignments = Arc::new(TaskAssignments::new(storage.tasks.clone()));
        let users = Arc::new(UserService::new(
            storage.users.clone(),
            assignments,
            gate.clone(),
        ));
        let tasks = Arc::new(TaskService::new(
            storage.tasks.clone(),
            users.clone(),
            gate,
        ));

        Self { users, tasks }
    }
}
