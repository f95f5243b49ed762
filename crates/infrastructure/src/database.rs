//! PostgreSQL connection pool and utilities
//!
//! Wraps a sqlx pool configured from [`DatabaseSettings`], with health
//! checks and embedded migrations.

use anyhow::Context;
use civicwatch_common::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Database connection pool wrapper with health monitoring.
#[derive(Clone)]
pub struct DatabasePool {
    pool: PgPool,
    statement_timeout_ms: u64,
}

impl DatabasePool {
    /// Create a new database pool with the given settings.
    ///
    /// Every connection is pinned to UTC and carries the configured
    /// server-side statement timeout, so a runaway query surfaces as a
    /// store timeout instead of holding a pool slot indefinitely.
    #[instrument(skip(settings), fields(max_connections = settings.max_connections))]
    pub async fn new(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        info!("Initializing database connection pool");

        let statement_timeout_ms = settings.statement_timeout().as_millis() as u64;
        let session_setup = statement_timeout_sql(statement_timeout_ms);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout())
            .idle_timeout(Some(Duration::from_secs(600)))
            .max_lifetime(Some(Duration::from_secs(1800)))
            .after_connect(move |conn, _meta| {
                let session_setup = session_setup.clone();
                Box::pin(async move {
                    sqlx::query("SET timezone = 'UTC'")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query(&session_setup).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect(&settings.url)
            .await
            .context("Failed to connect to Postgres")?;

        info!("Database pool initialized successfully");
        Ok(Self {
            pool,
            statement_timeout_ms,
        })
    }

    /// Get reference to the underlying pool.
    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The server-side statement timeout applied to every connection.
    #[inline]
    pub fn statement_timeout_ms(&self) -> u64 {
        self.statement_timeout_ms
    }

    /// Apply any pending migrations from the workspace `migrations/` directory.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Check database health by executing a simple query.
    ///
    /// Never fails: an unreachable database is reported as an unhealthy
    /// status, not an error.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthStatus {
        let start = std::time::Instant::now();

        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => {
                let latency = start.elapsed();
                debug!(latency_ms = latency.as_millis(), "Health check passed");
                HealthStatus {
                    healthy: true,
                    latency,
                    pool_size: self.pool.size(),
                    idle_connections: self.pool.num_idle(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Health check failed");
                HealthStatus {
                    healthy: false,
                    latency: start.elapsed(),
                    pool_size: self.pool.size(),
                    idle_connections: self.pool.num_idle(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Get current pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
        }
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish()
    }
}

fn statement_timeout_sql(timeout_ms: u64) -> String {
    format!("SET statement_timeout = '{timeout_ms}ms'")
}

/// Health status for database connections.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the database is healthy
    pub healthy: bool,
    /// Query latency
    pub latency: Duration,
    /// Current pool size
    pub pool_size: u32,
    /// Number of idle connections
    pub idle_connections: usize,
    /// Error message if unhealthy
    pub error: Option<String>,
}

/// Pool statistics.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    /// Current number of connections in the pool
    pub size: u32,
    /// Number of idle connections
    pub idle: usize,
}
