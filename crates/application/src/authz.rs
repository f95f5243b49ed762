//! Capability checks.
//!
//! One function decides what a caller may do. Services pass the acting user
//! and the attempted action; transports never re-implement role rules.

use crate::context::ActorContext;
use civicwatch_domain::{AuthorizationError, CoreError, CoreResult, UserId, UserRole};

/// An action a caller can attempt, with the facts the decision needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a new issue
    ReportIssue,
    /// Comment on any issue
    CommentOnIssue,
    /// Upvote any issue
    UpvoteIssue,
    /// Move an issue along its workflow
    UpdateIssueStatus {
        /// Who the issue is currently assigned to
        assigned_to: Option<UserId>,
    },
    /// Bind or re-bind an issue to an authority
    AssignIssue,
    /// Read an authority's work queue
    ViewAuthorityQueue {
        /// Whose queue is being read
        authority_id: UserId,
    },
    /// Read the global issue table with search
    ViewAdminBoard,
}

impl Action {
    /// Stable name used in error detail and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::ReportIssue => "report_issue",
            Action::CommentOnIssue => "comment_on_issue",
            Action::UpvoteIssue => "upvote_issue",
            Action::UpdateIssueStatus { .. } => "update_issue_status",
            Action::AssignIssue => "assign_issue",
            Action::ViewAuthorityQueue { .. } => "view_authority_queue",
            Action::ViewAdminBoard => "view_admin_board",
        }
    }
}

/// Decide whether `actor` may perform `action`.
///
/// Role claims come from the identity provider and are trusted as-is.
/// Assignee eligibility (role + active status) is a separate business rule
/// checked by the assignment service against the user directory, not here.
pub fn authorize(actor: &ActorContext, action: &Action) -> CoreResult<()> {
    let allowed = match action {
        Action::ReportIssue | Action::CommentOnIssue | Action::UpvoteIssue => true,
        Action::UpdateIssueStatus { assigned_to } => match actor.role {
            UserRole::Admin => true,
            UserRole::Authority => *assigned_to == Some(actor.user_id),
            UserRole::Citizen => false,
        },
        Action::AssignIssue => actor.role == UserRole::Admin,
        Action::ViewAuthorityQueue { authority_id } => match actor.role {
            UserRole::Admin => true,
            UserRole::Authority => *authority_id == actor.user_id,
            UserRole::Citizen => false,
        },
        Action::ViewAdminBoard => actor.role == UserRole::Admin,
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Authorization(
            AuthorizationError::InsufficientPermissions {
                action: action.name().to_string(),
            },
        ))
    }
}
