//! CivicWatch REST API
//!
//! This crate provides the Axum-based REST API for CivicWatch: reporting
//! civic infrastructure issues, driving them through their lifecycle, serving
//! geospatial and role-scoped feeds, and delivering per-user notifications
//! including a live SSE stream. It includes OpenAPI documentation, JWT
//! authentication, and consistent error handling.
//!
//! ## Architecture
//!
//! The API is organized into the following modules:
//!
//! - **app**: Application builder assembling routes and middleware
//! - **state**: Shared service handles and their wiring
//! - **routes**: HTTP route handlers organized by concern
//! - **middleware**: Request/response middleware (request IDs, logging)
//! - **extractors**: Custom Axum extractors for common patterns
//! - **responses**: Standardized response types
//! - **error**: HTTP error handling and conversion
//!
//! ## Usage
//!
//! ```rust,no_run
//! use civicwatch_api_rest::{create_app, AppState};
//! use civicwatch_common::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::development();
//!     let state = AppState::in_memory(config);
//!     let app = create_app(state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
//!         .await
//!         .expect("Failed to bind");
//!
//!     axum::serve(listener, app)
//!         .await
//!         .expect("Server error");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod responses;
pub mod routes;
pub mod state;

// Re-export commonly used types
pub use app::create_app;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;
