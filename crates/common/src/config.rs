//! Configuration management for the platform.
//!
//! One configuration type for every binary, loaded in layers: defaults, then
//! `config/default.toml`, then `config/{APP_ENV}.toml`, then `APP_`-prefixed
//! environment variables. Backend selection is implicit: with no `[database]`
//! section the process runs on the in-memory store, with no `[redis]` section
//! live pushes use the in-process channel.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! url = "postgres://localhost:5432/civicwatch"
//!
//! [auth]
//! jwt_secret = "..."
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Postgres settings; absent means the in-memory backend
    #[serde(default)]
    pub database: Option<DatabaseSettings>,

    /// Redis settings for the live channel; absent means in-process delivery
    #[serde(default)]
    pub redis: Option<RedisSettings>,

    pub auth: AuthSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins ("*" for any)
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Serve the OpenAPI UI at /swagger-ui
    #[serde(default = "default_enable_swagger")]
    pub enable_swagger: bool,
}

/// Postgres connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Connection pool upper bound
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connections kept warm
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Pool acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,

    /// Server-side statement timeout in seconds
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
}

/// Redis settings for the recipient channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL
    pub url: String,

    /// Prefix for per-recipient channels
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Secret verifying identity-provider JWTs
    pub jwt_secret: String,

    /// Accepted token lifetime in seconds
    #[serde(default = "default_token_expiry")]
    pub token_expiry_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Service name appearing in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub json_logging: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_request_timeout() -> u64 {
    30
}

fn default_enable_swagger() -> bool {
    true
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    5
}

fn default_statement_timeout() -> u64 {
    30
}

fn default_channel_prefix() -> String {
    "notify".to_string()
}

fn default_token_expiry() -> u64 {
    86400 // 24 hours
}

fn default_service_name() -> String {
    "civicwatch".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_origins(),
            request_timeout_seconds: default_request_timeout(),
            enable_swagger: default_enable_swagger(),
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            json_logging: false,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration, later sources overriding earlier ones:
    /// defaults, `config/default.toml`, `config/{APP_ENV}.toml`, then
    /// environment variables prefixed `APP_` with `__` separators
    /// (e.g. `APP_SERVER__PORT=3000`).
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if let Some(db) = &self.database {
            if db.url.is_empty() {
                anyhow::bail!("Database URL is required when [database] is configured");
            }
            if db.max_connections == 0 {
                anyhow::bail!("Database pool size must be greater than 0");
            }
            if db.min_connections > db.max_connections {
                anyhow::bail!("Database min_connections cannot exceed max_connections");
            }
        }

        if let Some(redis) = &self.redis {
            if redis.url.is_empty() {
                anyhow::bail!("Redis URL is required when [redis] is configured");
            }
        }

        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret is required");
        }
        if self.auth.jwt_secret.len() < 32 {
            anyhow::bail!("JWT secret must be at least 32 characters long");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.telemetry.log_level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    /// Token expiry as a Duration
    pub fn token_expiry(&self) -> Duration {
        Duration::from_secs(self.auth.token_expiry_seconds)
    }

    /// Bind address string for the listener
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Local development preset: in-memory backend, pretty debug logs.
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                ..ServerConfig::default()
            },
            database: None,
            redis: None,
            auth: AuthSettings {
                jwt_secret: "development-secret-key-minimum-32-chars".to_string(),
                token_expiry_seconds: 86400,
            },
            telemetry: TelemetrySettings {
                service_name: "civicwatch-dev".to_string(),
                json_logging: false,
                log_level: "debug".to_string(),
            },
        }
    }
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_seconds)
    }
}
