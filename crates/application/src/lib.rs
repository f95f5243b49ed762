//! Application layer for CivicWatch
//!
//! This crate orchestrates domain logic and coordinates between layers.
//!
//! ## Architecture
//!
//! Services here sit between the domain model and the storage/transport
//! layers. Every operation takes the acting user as an explicit
//! [`ActorContext`] parameter; nothing reads identity from ambient state.
//! Capability checks go through one [`authorize`] function so role rules
//! live in a single, transport-independent place.
//!
//! ## Modules
//!
//! - `services` - Business logic services (IssueService, FeedService, etc.)
//! - `ports` - Storage and delivery traits implemented by the infrastructure layer
//! - `authz` - Role/capability checks
//! - `validation` - Input validation framework

pub mod authz;
pub mod context;
pub mod ports;
pub mod services;
pub mod validation;

// Re-export commonly used types
pub use authz::{authorize, Action};
pub use context::ActorContext;
pub use ports::{
    GeoStore, IssueFilter, IssueStore, NearbyFilter, NearbyIssue, NotificationStore,
    NotificationStream, RecipientChannel, UserDirectory, ID_SUFFIX_SEARCH_MAX_LEN,
};
pub use services::{
    AssignmentService, FeedService, IssueService, IssueSummary, NearbyIssueSummary,
    NotificationDraft, NotificationService, RECENT_NOTIFICATIONS_LIMIT,
};
pub use validation::{
    AddCommentRequest, AdminListQuery, AssignIssueRequest, ChangeStatusRequest, NearbyQuery,
    QueueQuery, ReportIssueRequest, Validatable, ValidationResult, ValidationRules,
};
