//! Custom Axum extractors.
//!
//! Reusable extractors for the recurring request patterns: bearer-token
//! authentication, page selection, and validated JSON payloads.

pub mod auth;
pub mod pagination;
pub mod validated_json;

pub use auth::AuthenticatedUser;
pub use pagination::Pagination;
pub use validated_json::ValidatedJson;
