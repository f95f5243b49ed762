//! CivicWatch Domain Types
//!
//! Core domain model for the civic issue reporting platform: issues with
//! geographic locations, the fixed resolution workflow, users, notifications,
//! and the error taxonomy every layer above returns.
//!
//! ## Architecture
//!
//! - **identifiers**: Strongly-typed UUID-based identifiers for all entities
//! - **geo**: Validated geographic points and spherical distance math
//! - **issue**: The issue aggregate, status machine, and audit trail
//! - **user**: Roles, account status, and assignee eligibility
//! - **notification**: Durable per-recipient notification records
//! - **events**: Domain events emitted by lifecycle operations
//! - **errors**: The typed failure taxonomy with HTTP status mapping
//!
//! ## Usage
//!
//! ```rust
//! use civicwatch_domain::{
//!     geo::{GeoLocation, GeoPoint},
//!     identifiers::UserId,
//!     issue::{Issue, IssueCategory, IssueStatus},
//! };
//!
//! let location = GeoLocation::new(
//!     GeoPoint::new(77.2090, 28.6139).unwrap(),
//!     "Connaught Place, New Delhi",
//! );
//! let issue = Issue::new(
//!     "Deep pothole",
//!     "Opposite gate 3, dangerous for two-wheelers",
//!     IssueCategory::Pothole,
//!     location,
//!     UserId::new(),
//! );
//!
//! assert_eq!(issue.status, IssueStatus::Reported);
//! assert_eq!(issue.status_history.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

// Core domain modules
pub mod errors;
pub mod events;
pub mod geo;
pub mod identifiers;
pub mod issue;
pub mod notification;
pub mod user;

// Re-export commonly used types
pub use errors::{
    AssignmentError, AuthorizationError, CoreError, CoreResult, IssueError, NotificationError,
    StoreError, UserError, ValidationError,
};
pub use identifiers::*;

// Re-export key domain types
pub use events::IssueEvent;
pub use geo::{GeoLocation, GeoPoint};
pub use issue::{
    Comment, Issue, IssueCategory, IssuePriority, IssueStatus, SeverityTier, StatusChange,
};
pub use notification::Notification;
pub use user::{AccountStatus, User, UserRole};
