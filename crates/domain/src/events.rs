//! Domain events emitted by issue lifecycle operations.
//!
//! Every variant ends up as at least one recipient notification: the
//! dispatcher consumes these to build the durable records and live pushes.
//! Creation and upvoting notify nobody, so they have no event here.

use crate::identifiers::{CommentId, IssueId, UserId};
use crate::issue::IssueStatus;
use serde::{Deserialize, Serialize};

/// Issue lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueEvent {
    IssueAssigned {
        issue_id: IssueId,
        title: String,
        authority_id: UserId,
        assigned_by: UserId,
        reported_by: UserId,
        /// Set when this re-targets an already-assigned issue
        previous_authority: Option<UserId>,
    },
    StatusChanged {
        issue_id: IssueId,
        title: String,
        old_status: IssueStatus,
        new_status: IssueStatus,
        changed_by: UserId,
        reported_by: UserId,
    },
    CommentAdded {
        issue_id: IssueId,
        title: String,
        comment_id: CommentId,
        author: UserId,
        reported_by: UserId,
        /// The working authority, if any, so they hear about citizen comments
        assigned_to: Option<UserId>,
    },
}

impl IssueEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::IssueAssigned { .. } => "issue_assigned",
            Self::StatusChanged { .. } => "status_changed",
            Self::CommentAdded { .. } => "comment_added",
        }
    }

    pub fn issue_id(&self) -> IssueId {
        match self {
            Self::IssueAssigned { issue_id, .. }
            | Self::StatusChanged { issue_id, .. }
            | Self::CommentAdded { issue_id, .. } => *issue_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = IssueEvent::StatusChanged {
            issue_id: IssueId::new(),
            title: "Pothole".into(),
            old_status: IssueStatus::Assigned,
            new_status: IssueStatus::InProgress,
            changed_by: UserId::new(),
            reported_by: UserId::new(),
        };

        assert_eq!(event.event_type(), "status_changed");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["old_status"], "assigned");
        assert_eq!(json["new_status"], "in_progress");
    }

    #[test]
    fn test_issue_id_accessor() {
        let issue_id = IssueId::new();
        let event = IssueEvent::CommentAdded {
            issue_id,
            title: "Overflowing bin".into(),
            comment_id: CommentId::new(),
            author: UserId::new(),
            reported_by: UserId::new(),
            assigned_to: None,
        };

        assert_eq!(event.issue_id(), issue_id);
    }
}
