//! Error types for the CivicWatch core.
//!
//! A structured error hierarchy covering every failure path the core can
//! produce: input validation, workflow violations, authorization and assignee
//! eligibility, optimistic-concurrency conflicts, and store faults. Each error
//! carries an error code and HTTP status for API responses, and a retryability
//! flag for callers that back off on transient faults.

use crate::identifiers::*;
use crate::issue::IssueStatus;
use crate::user::AccountStatus;

/// Top-level error type for the core
///
/// Every operation in the core returns this (or a sub-enum of it). Nothing is
/// swallowed: each failure path surfaces as exactly one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Issue lifecycle errors (missing issue, bad transitions, terminal state)
    #[error("Issue error: {0}")]
    Issue(#[from] IssueError),

    /// User lookup errors
    #[error("User error: {0}")]
    User(#[from] UserError),

    /// Notification lookup errors
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Assignment eligibility errors
    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    /// Authorization errors
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistent store errors (conflicts, timeouts, unavailability)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal invariant violations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Machine-readable error code used in API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Issue(IssueError::NotFound(_)) => "ISSUE_NOT_FOUND",
            Self::Issue(IssueError::IllegalTransition { .. }) => "ILLEGAL_TRANSITION",
            Self::Issue(IssueError::TerminalState(_)) => "TERMINAL_STATE",
            Self::User(_) => "USER_NOT_FOUND",
            Self::Notification(_) => "NOTIFICATION_NOT_FOUND",
            Self::Assignment(_) => "INELIGIBLE_ASSIGNEE",
            Self::Authorization(AuthorizationError::AuthenticationRequired) => {
                "AUTHENTICATION_REQUIRED"
            }
            Self::Authorization(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(StoreError::Conflict { .. }) => "CONFLICT",
            Self::Store(StoreError::Timeout { .. }) => "TIMEOUT",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code this error maps to at the API boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Issue(IssueError::NotFound(_)) => 404,
            Self::Issue(IssueError::IllegalTransition { .. }) => 409,
            Self::Issue(IssueError::TerminalState(_)) => 409,
            Self::User(_) => 404,
            Self::Notification(_) => 404,
            Self::Assignment(_) => 422,
            Self::Authorization(AuthorizationError::AuthenticationRequired) => 401,
            Self::Authorization(_) => 403,
            Self::Validation(_) => 422,
            Self::Store(StoreError::Conflict { .. }) => 409,
            Self::Store(StoreError::Timeout { .. }) => 504,
            Self::Store(StoreError::Serialization(_)) => 500,
            Self::Store(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Whether a caller may blindly retry the failed operation.
    ///
    /// Only transient store faults qualify. Conflicts are NOT retryable here:
    /// the caller must re-read current state before attempting again, since
    /// the precondition it used has been invalidated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Timeout { .. }) | Self::Store(StoreError::Unavailable(_))
        )
    }
}

/// Issue lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// No issue with this id
    #[error("Issue not found: {0}")]
    NotFound(IssueId),

    /// The requested status edge does not exist in the workflow
    #[error("Status transition not allowed: {from:?} -> {to:?}")]
    IllegalTransition { from: IssueStatus, to: IssueStatus },

    /// The issue is resolved; no further mutation is possible
    #[error("Issue {0} is resolved and can no longer be modified")]
    TerminalState(IssueId),
}

/// User lookup errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// No user with this id
    #[error("User not found: {0}")]
    NotFound(UserId),
}

/// Notification lookup errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// No notification with this id
    #[error("Notification not found: {0}")]
    NotFound(NotificationId),
}

/// Assignment eligibility errors
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// The proposed assignee is not an authority
    #[error("User {authority_id} cannot be assigned: not an authority")]
    NotAnAuthority { authority_id: UserId },

    /// The authority's account is not active
    #[error("Authority {authority_id} cannot be assigned: account is {status:?}")]
    AuthorityNotActive {
        authority_id: UserId,
        status: AccountStatus,
    },
}

/// Authorization errors
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    /// Authentication required
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The caller's role does not permit this action
    #[error("Insufficient permissions for action: {action}")]
    InsufficientPermissions { action: String },

    /// The caller may not act on this particular resource
    #[error("Resource access denied")]
    AccessDenied,
}

/// Input validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Field validation failed
    #[error("Field validation failed: {field} - {message}")]
    FieldValidation { field: String, message: String },

    /// Multiple validation errors
    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<String>),

    /// Coordinates outside valid ranges
    #[error("Invalid coordinates: longitude {longitude}, latitude {latitude}")]
    InvalidCoordinates { longitude: f64, latitude: f64 },

    /// Invalid URL (evidence image references)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Persistent store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic-concurrency loss: someone else mutated the issue first.
    /// The caller must re-read before retrying.
    #[error("Concurrent update on issue {issue_id}: expected version {expected_version}")]
    Conflict {
        issue_id: IssueId,
        expected_version: i64,
    },

    /// Store call exceeded its deadline
    #[error("Store operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Store unreachable or refusing connections
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Core-wide result type
pub type CoreResult<T> = Result<T, CoreError>;
