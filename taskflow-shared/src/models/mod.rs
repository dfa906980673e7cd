/// Entity models for TaskFlow
///
/// Each entity has a stored record (also the externally returned view),
/// a validated draft used for inserts, a validated change set used for
/// partial updates, and raw request schemas for create and update.
///
/// # Models
///
/// - `id`: Backend-agnostic record identifier
/// - `user`: User accounts and roles
/// - `task`: Tasks, priorities, and per-user statistics

pub mod id;
pub mod task;
pub mod user;

pub use id::RecordId;

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Keeps a supplied field as raw JSON, including an explicit `null`
///
/// Use with `#[serde(default, deserialize_with = "present")]` on an
/// `Option<JsonValue>`: absent → `None`, `null` → `Some(JsonValue::Null)`.
/// Type checks are left to the services, so a field of the wrong JSON type
/// fails with that field's own validation message.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}
