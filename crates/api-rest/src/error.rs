//! API error types and their HTTP representation.
//!
//! Domain errors pass through [`ApiError::Core`] untouched and keep the
//! status/code mapping the domain defines. The remaining variants exist only
//! for failures that originate at the HTTP boundary itself: missing or bad
//! credentials and unparseable requests.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use civicwatch_domain::{CoreError, ValidationError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A core operation failed; status and code come from the domain mapping
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No bearer token on a protected endpoint
    #[error("Authentication required")]
    Unauthorized,

    /// The bearer token failed verification
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The request could not be parsed at all
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The request parsed but failed field validation
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(error) => StatusCode::from_u16(error.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Unauthorized | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Machine-readable error code, stable across releases.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Core(error) => error.error_code(),
            Self::Unauthorized => "AUTHENTICATION_REQUIRED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,

    /// Human-readable description
    pub message: String,

    /// Per-field detail when multiple validations failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "Request rejected");
        }

        let details = match &self {
            Self::Core(CoreError::Validation(ValidationError::Multiple(errors))) => {
                Some(errors.clone())
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civicwatch_domain::{IssueError, IssueId, IssueStatus, StoreError};

    #[test]
    fn test_core_errors_keep_the_domain_mapping() {
        let not_found: ApiError = CoreError::Issue(IssueError::NotFound(IssueId::new())).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.error_code(), "ISSUE_NOT_FOUND");

        let illegal: ApiError = CoreError::Issue(IssueError::IllegalTransition {
            from: IssueStatus::Reported,
            to: IssueStatus::Resolved,
        })
        .into();
        assert_eq!(illegal.status_code(), StatusCode::CONFLICT);
        assert_eq!(illegal.error_code(), "ILLEGAL_TRANSITION");

        let unavailable: ApiError =
            CoreError::Store(StoreError::Unavailable("connection refused".to_string())).into();
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_boundary_errors_map_to_auth_statuses() {
        assert_eq!(
            ApiError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidToken("expired".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::BadRequest("not json".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Validation("title too long".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_multiple_validation_failures_carry_details() {
        let error: ApiError = CoreError::Validation(ValidationError::Multiple(vec![
            "title: must not be empty".to_string(),
            "description: too long".to_string(),
        ]))
        .into();

        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
