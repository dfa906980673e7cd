/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskflow_api::app::{build_router, build_storage, AppState};
/// use taskflow_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let storage = build_storage(&config)?;
/// let state = AppState::new(storage, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::{Config, StorageBackend};
use crate::error::ApiError;
use axum::{
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use taskflow_shared::services::Services;
use taskflow_shared::storage::{Storage, StorageError};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// User and task services
    pub services: Services,

    /// Storage the services run on (health checks)
    pub storage: Storage,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state, wiring the services over `storage`
    pub fn new(storage: Storage, config: Config) -> Self {
        Self {
            services: Services::new(&storage),
            storage,
            config: Arc::new(config),
        }
    }
}

/// Builds the storage backend selected by the configuration
///
/// # Errors
///
/// Returns an error if the PostgREST backend is selected without
/// settings, or its HTTP client cannot be built.
pub fn build_storage(config: &Config) -> Result<Storage, StorageError> {
    match config.storage.backend {
        StorageBackend::Memory if config.storage.seed_demo_data => {
            tracing::info!("Using in-memory storage with demo data");
            Ok(Storage::memory_with_demo_data())
        }
        StorageBackend::Memory => {
            tracing::info!("Using empty in-memory storage");
            Ok(Storage::memory())
        }
        StorageBackend::Postgrest => {
            let postgrest = config.storage.postgrest.clone().ok_or_else(|| {
                StorageError::Config("postgrest backend selected without POSTGREST_URL".to_string())
            })?;
            tracing::info!(url = %postgrest.url, "Using PostgREST storage");
            Storage::postgrest(postgrest)
        }
    }
}

/// Every route the server answers, for the startup log
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("GET", "/api/health"),
    ("GET", "/api/users"),
    ("POST", "/api/users"),
    ("GET", "/api/users/:id"),
    ("PUT", "/api/users/:id"),
    ("DELETE", "/api/users/:id"),
    ("GET", "/api/users/:id/tasks"),
    ("GET", "/api/users/:id/stats"),
    ("GET", "/api/tasks"),
    ("POST", "/api/tasks"),
    ("GET", "/api/tasks/completed"),
    ("GET", "/api/tasks/pending"),
    ("GET", "/api/tasks/:id"),
    ("PUT", "/api/tasks/:id"),
    ("DELETE", "/api/tasks/:id"),
    ("PATCH", "/api/tasks/:id/complete"),
];

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api
/// ├── GET    /health
/// ├── /users
/// │   ├── GET    /            list
/// │   ├── POST   /            create
/// │   ├── GET    /:id         fetch
/// │   ├── PUT    /:id         update
/// │   ├── DELETE /:id         delete (blocked while tasks are assigned)
/// │   ├── GET    /:id/tasks   tasks assigned to the user
/// │   └── GET    /:id/stats   task statistics for the user
/// └── /tasks
///     ├── GET    /            list (?completada= | ?prioridad=)
///     ├── POST   /            create
///     ├── GET    /completed
///     ├── GET    /pending
///     ├── GET    /:id
///     ├── PUT    /:id
///     ├── DELETE /:id
///     └── PATCH  /:id/complete
/// ```
///
/// Unmatched paths fall through to a JSON 404.
pub fn build_router(state: AppState) -> Router {
    with_middleware(api_routes(), state)
}

/// The `/api` route tree, without middleware or state
pub fn api_routes() -> Router<AppState> {
    use crate::routes;

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/:id/tasks", get(routes::users::list_user_tasks))
        .route("/:id/stats", get(routes::users::user_stats));

    // Static segments take priority over `/:id` in axum's matcher
    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/completed", get(routes::tasks::list_completed))
        .route("/pending", get(routes::tasks::list_pending))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/complete", patch(routes::tasks::complete_task));

    let api = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/users", user_routes)
        .nest("/tasks", task_routes);

    Router::new().nest("/api", api)
}

/// Wraps `routes` in the fallback and middleware stack and attaches state
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Panic recovery (JSON 500 instead of a dropped connection)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
pub fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    routes
        .fallback(crate::routes::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Turns a handler panic into the generic 500 body
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "handler panicked".to_string()
    };

    ApiError::InternalError(detail).into_response()
}
