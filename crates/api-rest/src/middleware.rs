//! HTTP middleware components.
//!
//! Cross-cutting request processing:
//! - Request ID generation and propagation
//! - Request/response logging

pub mod logging;
pub mod request_id;

pub use logging::logging_middleware;
pub use request_id::{request_id_middleware, REQUEST_ID_HEADER};
