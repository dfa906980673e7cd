/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a
/// `.env` file, if present) into a type-safe struct.
///
/// # Environment Variables
///
/// - `APP_ENV`: `development` (default) or `production`
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `STORAGE_BACKEND`: `memory` (default) or `postgrest`
/// - `POSTGREST_URL`: PostgREST base URL (required for `postgrest`)
/// - `POSTGREST_API_KEY`: Optional key sent as `apikey` and bearer token
/// - `POSTGREST_TIMEOUT_SECS`: Per-request timeout (default: 10)
/// - `SEED_DEMO_DATA`: Seed the memory backend (default: true in development)
/// - `LOG_FORMAT`: `pretty` (default) or `json`
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskflow_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;
use taskflow_shared::storage::PostgrestConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage backend configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` means any)
    pub cors_origins: Vec<String>,

    /// Production mode (stricter CORS requirements, no demo data by default)
    pub production: bool,
}

/// Which storage backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-process tables, lost on restart
    Memory,

    /// Remote PostgREST-compatible table store
    Postgrest,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgrest" => Ok(StorageBackend::Postgrest),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}': expected memory or postgrest", other),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Present when `backend` is `Postgrest`
    pub postgrest: Option<PostgrestConfig>,

    /// Seed the memory backend with demo users and tasks
    pub seed_demo_data: bool,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

fn parse_bool(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean, got '{}'", key, other),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `POSTGREST_URL` is missing while `STORAGE_BACKEND=postgrest`
    /// - `CORS_ORIGINS` is `*` in production
    /// - A variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = match lookup("APP_ENV").as_deref().map(str::trim) {
            None | Some("development") => false,
            Some("production") => true,
            Some(other) => {
                anyhow::bail!("Unknown APP_ENV '{}': expected development or production", other)
            }
        };

        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        if production && (cors_origins.is_empty() || cors_origins.iter().any(|o| o == "*")) {
            anyhow::bail!("CORS_ORIGINS must list explicit origins in production");
        }

        let backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => StorageBackend::Memory,
        };

        let postgrest = match backend {
            StorageBackend::Memory => None,
            StorageBackend::Postgrest => {
                let url = lookup("POSTGREST_URL").ok_or_else(|| {
                    anyhow::anyhow!("POSTGREST_URL environment variable is required for the postgrest backend")
                })?;
                let timeout_seconds = lookup("POSTGREST_TIMEOUT_SECS")
                    .unwrap_or_else(|| "10".to_string())
                    .parse::<u64>()?;

                Some(PostgrestConfig {
                    url,
                    api_key: lookup("POSTGREST_API_KEY").filter(|k| !k.is_empty()),
                    timeout_seconds,
                })
            }
        };

        let seed_demo_data = match lookup("SEED_DEMO_DATA") {
            Some(raw) => parse_bool("SEED_DEMO_DATA", &raw)?,
            None => !production,
        };

        let json = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => false,
            Some("json") => true,
            Some(other) => anyhow::bail!("Unknown LOG_FORMAT '{}': expected pretty or json", other),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            storage: StorageConfig {
                backend,
                postgrest,
                seed_demo_data,
            },
            logging: LoggingConfig { json },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
