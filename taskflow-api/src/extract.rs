/// Request body extraction
///
/// `JsonBody<T>` accepts any request body that is empty, `null`, or a JSON
/// object. The first two yield `T::default()`, the same as `{}`, so the
/// service layer sees a request with no keys and answers with its own
/// "no data" message. Request schemas keep field values as raw JSON, so an
/// object never fails here; a field of the wrong type is reported by the
/// service under that field's message. Invalid JSON and non-object bodies
/// (arrays, scalars) are rejected as [`ApiError::MalformedBody`].
///
/// The `Content-Type` header is not checked.

use crate::error::{ApiError, ApiResult};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON object body that tolerates being absent
#[derive(Debug, Clone, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;

        parse_body(&bytes).map(JsonBody)
    }
}

fn parse_body<T>(bytes: &[u8]) -> ApiResult<T>
where
    T: DeserializeOwned + Default,
{
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    match value {
        Value::Null => Ok(T::default()),
        Value::Object(_) => {
            serde_json::from_value(value).map_err(|e| ApiError::MalformedBody(e.to_string()))
        }
        other => Err(ApiError::MalformedBody(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
