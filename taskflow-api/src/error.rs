/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `ApiResult<T>`; service errors convert with `?`.
///
/// # Response Bodies
///
/// Service failures carry only the user-facing message:
///
/// ```json
/// { "error": "El email ya está registrado" }
/// ```
///
/// Generic failures (unknown route, malformed body, storage outage,
/// internal error) also carry an explanation:
///
/// ```json
/// { "error": "Endpoint no encontrado", "mensaje": "La ruta solicitada no existe" }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskflow_shared::services::ServiceError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - failed validation
    BadRequest(String),

    /// Conflict - duplicate email, delete blocked by tasks
    ///
    /// Reported as 400, which is what existing clients expect.
    Conflict(String),

    /// Not found (404) - unknown id
    NotFound(String),

    /// Bad request (400) - body is not a JSON object
    MalformedBody(String),

    /// Not found (404) - no route matched
    RouteNotFound,

    /// Service unavailable (503) - storage backend unreachable or broken
    ///
    /// The detail is logged, never sent to clients.
    ServiceUnavailable(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error summary shown to users
    pub error: String,

    /// Additional explanation for generic failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensaje: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::MalformedBody(msg) => write!(f, "Malformed body: {}", msg),
            ApiError::RouteNotFound => write!(f, "Route not found"),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, mensaje) = match self {
            ApiError::BadRequest(msg) | ApiError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, msg, None)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::MalformedBody(detail) => {
                tracing::debug!("Rejected request body: {}", detail);
                (
                    StatusCode::BAD_REQUEST,
                    "Petición incorrecta".to_string(),
                    Some("Los datos enviados no son válidos".to_string()),
                )
            }
            ApiError::RouteNotFound => (
                StatusCode::NOT_FOUND,
                "Endpoint no encontrado".to_string(),
                Some("La ruta solicitada no existe".to_string()),
            ),
            ApiError::ServiceUnavailable(detail) => {
                // Backend detail may carry URLs or response bodies; keep it in the log
                tracing::warn!("Storage unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Servicio no disponible".to_string(),
                    Some("No se pudo acceder a los datos, inténtelo más tarde".to_string()),
                )
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error interno del servidor".to_string(),
                    Some("Ha ocurrido un error inesperado".to_string()),
                )
            }
        };

        (status, Json(ErrorResponse { error, mensaje })).into_response()
    }
}

/// Convert service errors to API errors
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Unavailable(err) => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}
