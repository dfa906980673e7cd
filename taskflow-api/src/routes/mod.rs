/// API route handlers
///
/// Handlers are thin: they parse the path id, extract the body, call the
/// service, and shape the response. Every failure is an [`ApiError`].

pub mod health;
pub mod tasks;
pub mod users;

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use taskflow_shared::models::RecordId;

/// Confirmation body returned by deletes
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parses a path id, treating anything unparseable as an unknown record
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).ok_or_else(|| ApiError::NotFound(not_found.to_string()))
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
