//! Application services
//!
//! Orchestration layer between transport and the domain: each service
//! validates input, authorizes the actor, drives the domain mutation through
//! a port, then hands resulting events to the notification service.

mod assignment;
mod feed;
mod issues;
mod notifications;

pub use assignment::AssignmentService;
pub use feed::{FeedService, IssueSummary, NearbyIssueSummary};
pub use issues::IssueService;
pub use notifications::{NotificationDraft, NotificationService, RECENT_NOTIFICATIONS_LIMIT};
