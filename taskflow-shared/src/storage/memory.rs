/// In-memory table backend
///
/// Records live in an ordered `Vec` guarded by a single `RwLock` together
/// with the next-id counter, so a lookup and a removal can never interleave
/// and ids are handed out exactly once. Ids start at 1 and are never reused,
/// even after deletes.
///
/// # Example
///
/// ```
/// use taskflow_shared::models::user::{NewUser, Role, User};
/// use taskflow_shared::storage::{MemoryTable, Table};
///
/// # async fn example() -> Result<(), taskflow_shared::storage::StorageError> {
/// let users = MemoryTable::<User>::new();
/// let ana = users
///     .insert(NewUser {
///         name: "Ana".to_string(),
///         email: "ana@x.com".to_string(),
///         role: Role::User,
///     })
///     .await?;
/// assert_eq!(ana.id.to_string(), "1");
/// # Ok(())
/// # }
/// ```

use super::{Record, StorageError, StorageResult, Table};
use crate::models::{
    task::{Priority, Task},
    user::{Role, User},
    RecordId,
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::debug;

struct Rows<R> {
    records: Vec<R>,
    next_id: i64,
}

/// Ordered in-process table
pub struct MemoryTable<R> {
    rows: RwLock<Rows<R>>,
}

impl<R: Record> MemoryTable<R> {
    /// Creates an empty table whose first id will be 1
    pub fn new() -> Self {
        Self::seeded(Vec::new())
    }

    /// Creates a table holding `records`
    ///
    /// The id counter continues after the highest integer id present.
    pub fn seeded(records: Vec<R>) -> Self {
        let next_id = records
            .iter()
            .filter_map(|r| match r.id() {
                RecordId::Int(id) => Some(*id),
                RecordId::Uuid(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        Self {
            rows: RwLock::new(Rows { records, next_id }),
        }
    }
}

impl<R: Record> Default for MemoryTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares one field of the record's key-value form against `value`
///
/// A missing field counts as `null`.
fn field_matches<R: Record>(record: &R, field: &str, value: &JsonValue) -> StorageResult<bool> {
    match serde_json::to_value(record).map_err(|e| StorageError::Encode(e.to_string()))? {
        JsonValue::Object(map) => Ok(map.get(field).unwrap_or(&JsonValue::Null) == value),
        other => Err(StorageError::Encode(format!(
            "{} record is not an object: {}",
            R::TABLE,
            other
        ))),
    }
}

#[async_trait]
impl<R: Record> Table<R> for MemoryTable<R> {
    async fn list(&self) -> StorageResult<Vec<R>> {
        Ok(self.rows.read().await.records.clone())
    }

    async fn list_where(&self, field: &str, value: &JsonValue) -> StorageResult<Vec<R>> {
        let rows = self.rows.read().await;
        let mut matched = Vec::new();
        for record in &rows.records {
            if field_matches(record, field, value)? {
                matched.push(record.clone());
            }
        }
        Ok(matched)
    }

    async fn get(&self, id: &RecordId) -> StorageResult<Option<R>> {
        let rows = self.rows.read().await;
        Ok(rows.records.iter().find(|r| r.id() == id).cloned())
    }

    async fn get_by(&self, field: &str, value: &JsonValue) -> StorageResult<Option<R>> {
        let rows = self.rows.read().await;
        for record in &rows.records {
            if field_matches(record, field, value)? {
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    async fn insert(&self, draft: R::Draft) -> StorageResult<R> {
        let mut rows = self.rows.write().await;
        let id = RecordId::Int(rows.next_id);
        rows.next_id += 1;

        let record = R::from_draft(id, draft);
        rows.records.push(record.clone());
        debug!(table = R::TABLE, id = %record.id(), "Inserted record");
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: R::Patch) -> StorageResult<Option<R>> {
        let mut rows = self.rows.write().await;
        match rows.records.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                record.apply(patch);
                debug!(table = R::TABLE, id = %id, "Updated record");
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &RecordId) -> StorageResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.records.iter().position(|r| r.id() == id) {
            Some(index) => {
                rows.records.remove(index);
                debug!(table = R::TABLE, id = %id, "Deleted record");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_where(&self, field: &str, value: &JsonValue) -> StorageResult<usize> {
        let rows = self.rows.read().await;
        let mut count = 0;
        for record in &rows.records {
            if field_matches(record, field, value)? {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// The demo data set the service ships with in development
///
/// Two users (an administrator and a regular user) and three tasks, two
/// of them assigned to the administrator.
pub fn demo_tables() -> (MemoryTable<User>, MemoryTable<Task>) {
    let users = vec![
        User {
            id: RecordId::Int(1),
            name: "Admin".to_string(),
            email: "admin@taskflow.com".to_string(),
            role: Role::Administrator,
        },
        User {
            id: RecordId::Int(2),
            name: "Juan Pérez".to_string(),
            email: "juan@email.com".to_string(),
            role: Role::User,
        },
    ];

    let tasks = vec![
        Task {
            id: RecordId::Int(1),
            title: "Diseñar base de datos".to_string(),
            description: "Crear el modelo ER de TaskFlow".to_string(),
            completed: true,
            priority: Priority::High,
            assignee_id: Some(RecordId::Int(1)),
        },
        Task {
            id: RecordId::Int(2),
            title: "Implementar API REST".to_string(),
            description: "Crear endpoints CRUD".to_string(),
            completed: false,
            priority: Priority::High,
            assignee_id: Some(RecordId::Int(1)),
        },
        Task {
            id: RecordId::Int(3),
            title: "Crear frontend con React".to_string(),
            description: "Interfaces de usuario".to_string(),
            completed: false,
            priority: Priority::Medium,
            assignee_id: Some(RecordId::Int(2)),
        },
    ];

    (MemoryTable::seeded(users), MemoryTable::seeded(tasks))
}
