//! Shared utilities for the CivicWatch platform.
//!
//! This crate provides the cross-cutting pieces every service binary needs:
//! - Configuration management
//! - Structured logging setup
//! - Pagination helpers
//! - Retry logic with backoff

pub mod config;
pub mod pagination;
pub mod retry;
pub mod telemetry;

// Re-export commonly used types
pub use config::{
    AppConfig, AuthSettings, DatabaseSettings, RedisSettings, ServerConfig, TelemetrySettings,
};
pub use pagination::{DateRange, Page, PageRequest, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use retry::{retry_if, retry_transient, RetryPolicy};
pub use telemetry::init_tracing;

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
