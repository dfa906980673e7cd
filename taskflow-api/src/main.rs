//! # TaskFlow API Server
//!
//! REST API for managing users and the tasks assigned to them.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskflow-api
//! STORAGE_BACKEND=postgrest POSTGREST_URL=http://localhost:3000 cargo run -p taskflow-api
//! ```

use taskflow_api::app::{build_router, build_storage, AppState, ENDPOINTS};
use taskflow_api::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "taskflow_api=debug,taskflow_shared=debug,tower_http=debug";

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.logging.json);

    tracing::info!(
        "TaskFlow API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let storage = build_storage(&config)?;
    if let Err(err) = storage.ping().await {
        // Keep serving; /api/health reports the outage
        tracing::warn!("Storage backend is not reachable yet: {}", err);
    }

    let address = config.bind_address();
    let state = AppState::new(storage, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    for (method, path) in ENDPOINTS {
        tracing::info!("  {:<6} {}", method, path);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
