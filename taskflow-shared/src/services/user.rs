/// User service
///
/// Validation and integrity rules for users:
///
/// - name: required, trimmed, not blank
/// - email: `local@domain.tld`, unique among current users (exact match)
/// - role: `administrador` or `usuario`, defaults to `usuario`
/// - delete: refused while any task is assigned to the user

use super::{
    required_text, text, AssignmentCounter, ServiceError, ServiceResult, UserDirectory, WriteGate,
    NO_DATA,
};
use crate::models::{
    user::{CreateUserRequest, NewUser, Role, UpdateUserRequest, User, UserChanges, EMAIL_FIELD},
    RecordId,
};
use crate::storage::Table;
use crate::validators::{is_valid_email, sanitize};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};

pub const USER_NOT_FOUND: &str = "Usuario no encontrado";
pub const NAME_REQUIRED: &str = "El nombre es requerido y no puede estar vacío";
pub const NAME_EMPTY: &str = "El nombre no puede estar vacío";
pub const INVALID_EMAIL: &str = "El email no es válido";
pub const EMAIL_REGISTERED: &str = "El email ya está registrado";
pub const EMAIL_IN_USE: &str = "El email ya está en uso";
pub const USER_HAS_TASKS: &str = "No se puede eliminar un usuario con tareas asignadas";

/// Users CRUD with uniqueness and role rules
pub struct UserService {
    users: Arc<dyn Table<User>>,
    assignments: Arc<dyn AssignmentCounter>,
    gate: WriteGate,
}

fn invalid_role() -> ServiceError {
    let roles: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
    ServiceError::Validation(format!("El rol debe ser uno de: {}", roles.join(", ")))
}

fn parse_role(raw: Option<&str>) -> ServiceResult<Role> {
    raw.and_then(|r| r.parse().ok()).ok_or_else(invalid_role)
}

fn valid_email(raw: Option<&str>) -> ServiceResult<String> {
    match sanitize(raw) {
        Some(email) if is_valid_email(&email) => Ok(email),
        _ => Err(ServiceError::validation(INVALID_EMAIL)),
    }
}

impl UserService {
    pub fn new(
        users: Arc<dyn Table<User>>,
        assignments: Arc<dyn AssignmentCounter>,
        gate: WriteGate,
    ) -> Self {
        Self {
            users,
            assignments,
            gate,
        }
    }

    /// All users in storage order
    pub async fn list_all(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.list().await?)
    }

    pub async fn get_by_id(&self, id: &RecordId) -> ServiceResult<Option<User>> {
        Ok(self.users.get(id).await?)
    }

    /// Exact (case-sensitive) email lookup
    pub async fn get_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .users
            .get_by(EMAIL_FIELD, &JsonValue::String(email.to_string()))
            .await?)
    }

    pub async fn exists(&self, id: &RecordId) -> ServiceResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    /// Creates a user
    ///
    /// Checks run in order: no data, name, email format, email uniqueness,
    /// role. The first failure wins.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing/blank/malformed fields
    /// - `Conflict` if the email is already registered
    /// - `Unavailable` if storage cannot be reached
    pub async fn create(&self, input: CreateUserRequest) -> ServiceResult<User> {
        if input.is_empty() {
            return Err(ServiceError::validation(NO_DATA));
        }

        let name = required_text(text(input.name.as_ref()), NAME_REQUIRED)?;
        let email = valid_email(text(input.email.as_ref()))?;

        let _guard = self.gate.enter().await;

        if self.get_by_email(&email).await?.is_some() {
            return Err(ServiceError::conflict(EMAIL_REGISTERED));
        }

        let role = match &input.role {
            None => Role::default(),
            Some(raw) => parse_role(raw.as_str())?,
        };

        let user = self.users.insert(NewUser { name, email, role }).await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "User created");
        Ok(user)
    }

    /// Applies a partial update
    ///
    /// Every supplied field is validated before anything is written; a
    /// rejected request leaves the user untouched. The uniqueness check
    /// ignores the user's own current email.
    pub async fn update(&self, id: &RecordId, input: UpdateUserRequest) -> ServiceResult<User> {
        if input.is_empty() {
            return Err(ServiceError::validation(NO_DATA));
        }

        let _guard = self.gate.enter().await;

        let current = self
            .users
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;

        let mut changes = UserChanges::default();

        if let Some(name) = &input.name {
            changes.name = Some(required_text(name.as_str(), NAME_EMPTY)?);
        }

        if let Some(email) = &input.email {
            let email = valid_email(email.as_str())?;
            if email != current.email && self.get_by_email(&email).await?.is_some() {
                return Err(ServiceError::conflict(EMAIL_IN_USE));
            }
            changes.email = Some(email);
        }

        if let Some(role) = &input.role {
            changes.role = Some(parse_role(role.as_str())?);
        }

        if changes.is_empty() {
            return Ok(current);
        }

        let user = self
            .users
            .update(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Deletes a user that no task references
    ///
    /// The assignment check comes first, matching the order clients rely
    /// on: a user with tasks is reported as blocked, not missing.
    pub async fn delete(&self, id: &RecordId) -> ServiceResult<()> {
        let _guard = self.gate.enter().await;

        let assigned = self.assignments.count_assigned(id).await?;
        if assigned > 0 {
            warn!(user_id = %id, assigned, "Refusing to delete user with assigned tasks");
            return Err(ServiceError::conflict(USER_HAS_TASKS));
        }

        if !self.users.delete(id).await? {
            return Err(ServiceError::not_found(USER_NOT_FOUND));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for UserService {
    async fn user_exists(&self, id: &RecordId) -> ServiceResult<bool> {
        self.exists(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::CreateTaskRequest;
    use crate::services::Services;
    use crate::storage::{Storage, StorageError, StorageResult};

    fn services() -> Services {
        Services::new(&Storage::memory())
    }

    fn create_req(name: &str, email: &str, role: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            role: role.map(JsonValue::from),
            ..Default::default()
        }
    }

    fn assert_validation(result: ServiceResult<User>, expected: &str) {
        match result {
            Err(ServiceError::Validation(msg)) => assert_eq!(msg, expected),
            other => panic!("expected validation error {expected:?}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_role_and_trims() {
        let s = services();

        let user = s
            .users
            .create(create_req("  Ana  ", " ana@x.com ", None))
            .await
            .unwrap();

        assert_eq!(user.name, "Ana");
        assert_eq!(user.email, "ana@x.com");
        assert_eq!(user.role, Role::User);
        assert_eq!(s.users.get_by_id(&user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_create_validation_order() {
        let s = services();

        assert_validation(s.users.create(CreateUserRequest::default()).await, NO_DATA);
        assert_validation(
            s.users.create(create_req("   ", "bad", Some("root"))).await,
            NAME_REQUIRED,
        );
        assert_validation(
            s.users.create(create_req("Ana", "bad", Some("root"))).await,
            INVALID_EMAIL,
        );
        assert_validation(
            s.users.create(create_req("Ana", "ana@x.com", Some("root"))).await,
            "El rol debe ser uno de: administrador, usuario",
        );
        assert!(s.users.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_reads_wrong_types_as_invalid_fields() {
        let s = services();

        assert_validation(
            s.users
                .create(CreateUserRequest {
                    name: Some(JsonValue::Null),
                    ..Default::default()
                })
                .await,
            NAME_REQUIRED,
        );

        let mut unknown_only = CreateUserRequest::default();
        unknown_only.other.insert("apodo".to_string(), "Anita".into());
        assert_validation(s.users.create(unknown_only).await, NAME_REQUIRED);

        assert_validation(
            s.users
                .create(CreateUserRequest {
                    name: Some(123.into()),
                    email: Some("ana@x.com".into()),
                    ..Default::default()
                })
                .await,
            NAME_REQUIRED,
        );
        assert_validation(
            s.users
                .create(CreateUserRequest {
                    name: Some("Ana".into()),
                    email: Some(true.into()),
                    ..Default::default()
                })
                .await,
            INVALID_EMAIL,
        );
        assert_validation(
            s.users
                .create(CreateUserRequest {
                    name: Some("Ana".into()),
                    email: Some("ana@x.com".into()),
                    role: Some(JsonValue::Null),
                    ..Default::default()
                })
                .await,
            "El rol debe ser uno de: administrador, usuario",
        );
        assert!(s.users.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_accepts_role_case_insensitively() {
        let s = services();

        let user = s
            .users
            .create(create_req("Root", "root@x.com", Some("ADMINISTRADOR")))
            .await
            .unwrap();

        assert_eq!(user.role, Role::Administrator);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let s = services();
        s.users
            .create(create_req("Ana", "ana@x.com", None))
            .await
            .unwrap();

        let err = s
            .users
            .create(create_req("Otra", "ana@x.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(ref m) if m == EMAIL_REGISTERED));
        assert_eq!(s.users.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let s = services();
        let ana = s
            .users
            .create(create_req("Ana", "ana@x.com", None))
            .await
            .unwrap();

        let updated = s
            .users
            .update(
                &ana.id,
                UpdateUserRequest {
                    role: Some("administrador".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.email, "ana@x.com");
        assert_eq!(updated.role, Role::Administrator);
    }

    #[tokio::test]
    async fn test_update_keeping_own_email_is_allowed() {
        let s = services();
        let ana = s
            .users
            .create(create_req("Ana", "ana@x.com", None))
            .await
            .unwrap();

        let updated = s
            .users
            .update(
                &ana.id,
                UpdateUserRequest {
                    name: Some("Ana María".into()),
                    email: Some("ana@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ana María");
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_conflict_and_atomic() {
        let s = services();
        let ana = s
            .users
            .create(create_req("Ana", "ana@x.com", None))
            .await
            .unwrap();
        s.users
            .create(create_req("Bob", "bob@x.com", None))
            .await
            .unwrap();

        let err = s
            .users
            .update(
                &ana.id,
                UpdateUserRequest {
                    name: Some("Changed".into()),
                    email: Some("bob@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(ref m) if m == EMAIL_IN_USE));

        let unchanged = s.users.get_by_id(&ana.id).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "Ana");
    }

    #[tokio::test]
    async fn test_update_rejects_null_name_and_unknown_user() {
        let s = services();
        let ana = s
            .users
            .create(create_req("Ana", "ana@x.com", None))
            .await
            .unwrap();

        assert_validation(
            s.users
                .update(
                    &ana.id,
                    UpdateUserRequest {
                        name: Some(JsonValue::Null),
                        ..Default::default()
                    },
                )
                .await,
            NAME_EMPTY,
        );

        assert_validation(
            s.users
                .update(&ana.id, UpdateUserRequest::default())
                .await,
            NO_DATA,
        );

        let err = s
            .users
            .update(
                &RecordId::Int(99),
                UpdateUserRequest {
                    name: Some("X".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == USER_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_delete_blocked_until_tasks_removed() {
        let s = services();
        let ana = s
            .users
            .create(create_req("Ana", "ana@x.com", None))
            .await
            .unwrap();
        let task = s
            .tasks
            .create(CreateTaskRequest {
                title: Some("Write docs".into()),
                assignee_id: Some(ana.id.to_json()),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = s.users.delete(&ana.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == USER_HAS_TASKS));
        assert!(s.users.exists(&ana.id).await.unwrap());

        s.tasks.delete(&task.id).await.unwrap();
        s.users.delete(&ana.id).await.unwrap();
        assert!(!s.users.exists(&ana.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let s = services();
        let err = s.users.delete(&RecordId::Int(7)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == USER_NOT_FOUND));
    }

    struct UnreachableCounter;

    #[async_trait]
    impl AssignmentCounter for UnreachableCounter {
        async fn count_assigned(&self, _user_id: &RecordId) -> ServiceResult<usize> {
            let err: StorageResult<usize> =
                Err(StorageError::Transport("connection refused".to_string()));
            Ok(err?)
        }
    }

    #[tokio::test]
    async fn test_delete_surfaces_unavailable_counter() {
        let storage = Storage::memory();
        let users = UserService::new(
            storage.users.clone(),
            Arc::new(UnreachableCounter),
            WriteGate::new(),
        );

        let err = users.delete(&RecordId::Int(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
    }
}
