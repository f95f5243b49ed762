//! API v1 routes.

use crate::state::AppState;
use axum::Router;

pub mod feeds;
pub mod issues;
pub mod notifications;

/// Create all v1 API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(issues::routes())
        .merge(feeds::routes())
        .merge(notifications::routes())
}
