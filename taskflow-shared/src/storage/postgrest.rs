/// PostgREST table backend
///
/// Maps the storage port onto PostgREST's HTTP dialect:
///
/// ```text
/// list         GET    /{table}?order=id.asc
/// list_where   GET    /{table}?{field}=eq.{value}&order=id.asc
/// get          GET    /{table}?id=eq.{id}
/// get_by       GET    /{table}?{field}=eq.{value}&limit=1
/// insert       POST   /{table}                   Prefer: return=representation
/// update       PATCH  /{table}?id=eq.{id}        Prefer: return=representation
/// delete       DELETE /{table}?id=eq.{id}        Prefer: return=representation
/// count_where  GET    /{table}?{field}=eq.{value}&select=id   Prefer: count=exact
/// ```
///
/// Every request is independent; there is no client-side caching. Any
/// transport failure, non-2xx status, or undecodable body is returned as a
/// [`StorageError`], so callers can tell "unreachable" from "not found".
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::models::user::User;
/// use taskflow_shared::storage::{PostgrestClient, PostgrestConfig, PostgrestTable, Table};
///
/// # async fn example() -> Result<(), taskflow_shared::storage::StorageError> {
/// let client = PostgrestClient::new(PostgrestConfig {
///     url: "http://localhost:3000".to_string(),
///     api_key: None,
///     timeout_seconds: 10,
/// })?;
/// let users = PostgrestTable::<User>::new(client);
/// let all = users.list().await?;
/// # Ok(())
/// # }
/// ```

use super::{Record, StorageError, StorageResult, Table};
use crate::models::RecordId;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE},
    Client, RequestBuilder, Response,
};
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, warn};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const COUNT_EXACT: &str = "count=exact";

/// Connection settings for a PostgREST endpoint
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Base URL, e.g. `https://project.supabase.co/rest/v1`
    pub url: String,

    /// Sent as both `apikey` and `Authorization: Bearer` when present
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout_seconds: u64,
}

/// Shared HTTP client bound to one PostgREST base URL
///
/// Cheap to clone; all tables share one connection pool.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    http: Client,
    base_url: String,
}

impl PostgrestClient {
    /// Builds the client with auth headers and timeout applied to every request
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the API key is not a valid header
    /// value or the underlying client cannot be constructed.
    pub fn new(config: PostgrestConfig) -> StorageResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|e| StorageError::Config(format!("Invalid API key: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| StorageError::Config(format!("Invalid API key: {}", e)))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }
}

/// One remote table
pub struct PostgrestTable<R> {
    client: PostgrestClient,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> PostgrestTable<R> {
    /// Table handle sharing the client's connection pool
    pub fn new(client: PostgrestClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    fn url(&self) -> String {
        self.client.table_url(R::TABLE)
    }

    /// Sends a request and decodes the JSON array PostgREST answers with
    async fn fetch_rows(&self, request: RequestBuilder) -> StorageResult<Vec<R>> {
        let response = send(request).await?;
        response
            .json::<Vec<R>>()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))
    }

    async fn first_row(&self, request: RequestBuilder) -> StorageResult<Option<R>> {
        Ok(self.fetch_rows(request).await?.into_iter().next())
    }
}

/// PostgREST filter operand for an equality match
fn eq_filter(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "is.null".to_string(),
        JsonValue::String(s) => format!("eq.{}", s),
        other => format!("eq.{}", other),
    }
}

fn id_filter(id: &RecordId) -> String {
    format!("eq.{}", id)
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`
fn content_range_total(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

/// Sends the request, turning transport errors and non-2xx statuses into
/// [`StorageError`]
async fn send(request: RequestBuilder) -> StorageResult<Response> {
    let response = request.send().await.map_err(|e| {
        warn!(error = %e, "PostgREST request failed");
        StorageError::from(e)
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "PostgREST returned an error status");
    Err(StorageError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl<R: Record> Table<R> for PostgrestTable<R> {
    async fn list(&self) -> StorageResult<Vec<R>> {
        debug!(table = R::TABLE, "PostgREST list");
        let request = self
            .client
            .http
            .get(self.url())
            .query(&[("order", "id.asc")]);
        self.fetch_rows(request).await
    }

    async fn list_where(&self, field: &str, value: &JsonValue) -> StorageResult<Vec<R>> {
        debug!(table = R::TABLE, field, %value, "PostgREST list_where");
        let request = self
            .client
            .http
            .get(self.url())
            .query(&[(field, eq_filter(value).as_str()), ("order", "id.asc")]);
        self.fetch_rows(request).await
    }

    async fn get(&self, id: &RecordId) -> StorageResult<Option<R>> {
        debug!(table = R::TABLE, %id, "PostgREST get");
        let request = self
            .client
            .http
            .get(self.url())
            .query(&[("id", id_filter(id))]);
        self.first_row(request).await
    }

    async fn get_by(&self, field: &str, value: &JsonValue) -> StorageResult<Option<R>> {
        debug!(table = R::TABLE, field, %value, "PostgREST get_by");
        let request = self
            .client
            .http
            .get(self.url())
            .query(&[(field, eq_filter(value).as_str()), ("limit", "1")]);
        self.first_row(request).await
    }

    async fn insert(&self, draft: R::Draft) -> StorageResult<R> {
        debug!(table = R::TABLE, "PostgREST insert");
        let request = self
            .client
            .http
            .post(self.url())
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&draft);

        self.first_row(request).await?.ok_or_else(|| {
            StorageError::Decode(format!("{} insert returned no representation", R::TABLE))
        })
    }

    async fn update(&self, id: &RecordId, patch: R::Patch) -> StorageResult<Option<R>> {
        debug!(table = R::TABLE, %id, "PostgREST update");
        let request = self
            .client
            .http
            .patch(self.url())
            .query(&[("id", id_filter(id))])
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&patch);
        self.first_row(request).await
    }

    async fn delete(&self, id: &RecordId) -> StorageResult<bool> {
        debug!(table = R::TABLE, %id, "PostgREST delete");
        let request = self
            .client
            .http
            .delete(self.url())
            .query(&[("id", id_filter(id))])
            .header(PREFER, RETURN_REPRESENTATION);
        Ok(!self.fetch_rows(request).await?.is_empty())
    }

    async fn count_where(&self, field: &str, value: &JsonValue) -> StorageResult<usize> {
        debug!(table = R::TABLE, field, %value, "PostgREST count_where");
        let request = self
            .client
            .http
            .get(self.url())
            .query(&[(field, eq_filter(value).as_str()), ("select", "id")])
            .header(PREFER, COUNT_EXACT);

        let response = send(request).await?;
        if let Some(total) = content_range_total(response.headers()) {
            return Ok(total);
        }

        let rows = response
            .json::<Vec<JsonValue>>()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))?;
        Ok(rows.len())
    }

    async fn ping(&self) -> StorageResult<()> {
        let request = self
            .client
            .http
            .get(self.url())
            .query(&[("select", "id"), ("limit", "1")]);
        send(request).await.map(|_| ())
    }
}
