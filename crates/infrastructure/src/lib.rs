//! Infrastructure layer for CivicWatch
//!
//! Concrete backends behind the application's port traits:
//! - PostgreSQL stores (sqlx) for durable issues, users, and notifications
//! - An in-memory backend for local development and tests
//! - Live notification channels: in-process broadcast or Redis pub/sub
//!
//! ## Architecture
//!
//! Every store implements a port trait from `civicwatch-application` and
//! returns domain errors, so services never see driver types. Backend
//! selection is a wiring decision: binaries pick Postgres + Redis when
//! configured and fall back to the in-memory pair otherwise.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use civicwatch_infrastructure::{DatabasePool, PgIssueStore};
//!
//! let pool = DatabasePool::new(&settings).await?;
//! pool.run_migrations().await?;
//! let issues = PgIssueStore::new(&pool);
//! ```

pub mod channel;
pub mod database;
pub mod memory;
pub mod postgres;

pub use channel::{InProcessRecipientChannel, RedisRecipientChannel};
pub use database::{DatabasePool, HealthStatus, PoolStats};
pub use memory::InMemoryBackend;
pub use postgres::{PgIssueStore, PgNotificationStore, PgUserDirectory};
