/// Storage port and backends
///
/// The services only ever talk to [`Table`], one instance per entity
/// collection. Two backends implement it:
///
/// - `memory`: ordered in-process list with a never-reused id counter
/// - `postgrest`: HTTP calls against a PostgREST-compatible table store
///
/// Backend failures are always reported as [`StorageError`]. A transport
/// problem must never look like "no such record".
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::storage::Storage;
///
/// # async fn example() -> Result<(), taskflow_shared::storage::StorageError> {
/// let storage = Storage::memory();
/// let users = storage.users.list().await?;
/// assert!(users.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgrest;

use crate::models::{task::Task, user::User, RecordId};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryTable;
pub use postgrest::{PostgrestClient, PostgrestConfig, PostgrestTable};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Could not reach the backend (connect, timeout, reset)
    #[error("Storage transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("Storage returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Backend answered with a body we could not decode
    #[error("Storage response could not be decoded: {0}")]
    Decode(String),

    /// A record could not be turned into its key-value form
    #[error("Storage record could not be encoded: {0}")]
    Encode(String),

    /// Backend client could not be configured
    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StorageError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StorageError::UnexpectedStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            StorageError::Transport(err.to_string())
        }
    }
}

/// Storage result type alias
pub type StorageResult<T> = Result<T, StorageError>;

/// An entity that can live in a [`Table`]
///
/// The serde representation is the plain key-value form: it is what the
/// remote store receives and what `get_by` / `count_where` match against.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table (collection) name
    const TABLE: &'static str;

    /// Validated insert data, without an id
    type Draft: Serialize + Send + Sync + 'static;

    /// Validated partial update
    type Patch: Serialize + Send + Sync + 'static;

    /// Identifier assigned by storage
    fn id(&self) -> &RecordId;

    /// Builds the stored record once storage has assigned an id
    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    /// Applies a partial update in place
    fn apply(&mut self, patch: Self::Patch);
}

/// CRUD port for one entity collection
#[async_trait]
pub trait Table<R: Record>: Send + Sync {
    /// All records in the backend's natural (id) order
    async fn list(&self) -> StorageResult<Vec<R>>;

    /// All records whose `field` equals `value`, in id order
    async fn list_where(&self, field: &str, value: &JsonValue) -> StorageResult<Vec<R>>;

    /// Record with the given id, if any
    async fn get(&self, id: &RecordId) -> StorageResult<Option<R>>;

    /// First record whose `field` equals `value`
    async fn get_by(&self, field: &str, value: &JsonValue) -> StorageResult<Option<R>>;

    /// Persists a new record, assigning its id
    async fn insert(&self, draft: R::Draft) -> StorageResult<R>;

    /// Applies a patch; `None` if the id is unknown
    async fn update(&self, id: &RecordId, patch: R::Patch) -> StorageResult<Option<R>>;

    /// Removes a record; `false` if the id is unknown
    async fn delete(&self, id: &RecordId) -> StorageResult<bool>;

    /// Number of records whose `field` equals `value`
    async fn count_where(&self, field: &str, value: &JsonValue) -> StorageResult<usize>;

    /// Cheap connectivity check
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Both entity tables plus the backend they live in
///
/// Cloning is cheap (`Arc` internally).
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn Table<User>>,
    pub tasks: Arc<dyn Table<Task>>,
    backend: &'static str,
}

impl Storage {
    /// Assembles storage from arbitrary table implementations
    pub fn new(
        users: Arc<dyn Table<User>>,
        tasks: Arc<dyn Table<Task>>,
        backend: &'static str,
    ) -> Self {
        Self {
            users,
            tasks,
            backend,
        }
    }

    /// Empty in-memory storage
    pub fn memory() -> Self {
        Self::new(
            Arc::new(MemoryTable::<User>::new()),
            Arc::new(MemoryTable::<Task>::new()),
            "memory",
        )
    }

    /// In-memory storage seeded with the demo users and tasks
    pub fn memory_with_demo_data() -> Self {
        let (users, tasks) = memory::demo_tables();
        Self::new(Arc::new(users), Arc::new(tasks), "memory")
    }

    /// Remote PostgREST storage
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the HTTP client cannot be built
    /// (e.g. an API key that is not a valid header value).
    pub fn postgrest(config: PostgrestConfig) -> StorageResult<Self> {
        let client = PostgrestClient::new(config)?;
        Ok(Self::new(
            Arc::new(PostgrestTable::<User>::new(client.clone())),
            Arc::new(PostgrestTable::<Task>::new(client)),
            "postgrest",
        ))
    }

    /// Backend name (`memory` or `postgrest`)
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Checks that the backend is reachable
    pub async fn ping(&self) -> StorageResult<()> {
        self.users.ping().await?;
        self.tasks.ping().await
    }
}
