//! Pagination extractor.
//!
//! Feed ordering is fixed per endpoint (distance or recency), so only `page`
//! and `per_page` come from the query string. Out-of-range values are clamped
//! by [`PageRequest`] instead of rejected.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use civicwatch_common::pagination::PageRequest;

/// Extracted page selection for list endpoints
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    /// Sanitized page request
    pub request: PageRequest,
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(request) = Query::<PageRequest>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid pagination parameters: {e}")))?;

        Ok(Self {
            request: request.sanitized(),
        })
    }
}
