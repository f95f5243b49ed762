//! PostgreSQL implementations of the storage ports.
//!
//! Issues persist scalar columns plus JSONB for the nested collections
//! (comments, status history, image lists); the spatial index lives in a
//! companion `issue_locations` table (PostGIS geography) written in the
//! same transaction as the issue row. All queries are runtime-checked
//! sqlx; driver failures map onto the shared store error taxonomy here.

mod issue_store;
mod notification_store;
mod user_directory;

pub use issue_store::PgIssueStore;
pub use notification_store::PgNotificationStore;
pub use user_directory::PgUserDirectory;

use civicwatch_domain::{CoreError, CoreResult, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Postgres SQLSTATE for a statement cancelled by `statement_timeout`.
const SQLSTATE_QUERY_CANCELED: &str = "57014";

/// Map a driver failure onto the store error taxonomy.
///
/// Statement timeouts become `StoreError::Timeout` carrying the session
/// timeout the pool configured; connectivity failures become
/// `Unavailable`; everything else is a query failure tagged with the
/// operation name.
pub(crate) fn db_error(operation: &str, statement_timeout_ms: u64, err: sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable("timed out acquiring a connection from the pool".to_string())
                .into()
        }
        sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            StoreError::Unavailable("connection pool is closed".to_string()).into()
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()).into(),
        sqlx::Error::Tls(e) => StoreError::Unavailable(e.to_string()).into(),
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLSTATE_QUERY_CANCELED) => {
            StoreError::Timeout {
                operation: operation.to_string(),
                timeout_ms: statement_timeout_ms,
            }
            .into()
        }
        other => StoreError::QueryFailed(format!("{operation}: {other}")).into(),
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> CoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()).into())
}

pub(crate) fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> CoreResult<T> {
    serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()).into())
}

/// Decode a stored enum name. Failure means the row predates the running
/// schema or was written by hand; surfaced as a serialization error.
pub(crate) fn parse_stored<T>(raw: &str, what: &str) -> CoreResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| StoreError::Serialization(format!("stored {what}: {e}")).into())
}

/// Escape LIKE metacharacters so a search term is matched literally.
/// Filter semantics are plain substring; `%`/`_` in user input must not
/// act as wildcards.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
