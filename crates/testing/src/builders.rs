//! Fluent builders for constructing test data.
//!
//! Builders drive the real domain constructors and workflow methods, so an
//! issue built as "in progress" carries the same audit trail a live one
//! would.

use chrono::{Duration, Utc};
use civicwatch_domain::{
    geo::{GeoLocation, GeoPoint},
    identifiers::UserId,
    issue::{Comment, Issue, IssueCategory, IssuePriority, IssueStatus},
    notification::Notification,
    user::{AccountStatus, User, UserRole},
};

/// Builder for creating User test instances
#[derive(Clone)]
pub struct UserBuilder {
    id: UserId,
    display_name: String,
    role: UserRole,
    status: AccountStatus,
    department: Option<String>,
    assigned_area: Option<String>,
}

impl UserBuilder {
    pub fn new() -> Self {
        Self {
            id: UserId::new(),
            display_name: "Asha Verma".to_string(),
            role: UserRole::Citizen,
            status: AccountStatus::Active,
            department: None,
            assigned_area: None,
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn citizen(mut self) -> Self {
        self.role = UserRole::Citizen;
        self
    }

    pub fn authority(mut self) -> Self {
        self.role = UserRole::Authority;
        if self.department.is_none() {
            self.department = Some("Public Works".to_string());
        }
        self
    }

    pub fn admin(mut self) -> Self {
        self.role = UserRole::Admin;
        self
    }

    pub fn suspended(mut self) -> Self {
        self.status = AccountStatus::Suspended;
        self
    }

    pub fn on_leave(mut self) -> Self {
        self.status = AccountStatus::OnLeave;
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.assigned_area = Some(area.into());
        self
    }

    pub fn build(self) -> User {
        User {
            id: self.id,
            display_name: self.display_name,
            role: self.role,
            status: self.status,
            department: self.department,
            assigned_area: self.assigned_area,
            created_at: Utc::now(),
        }
    }
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating Issue test instances
#[derive(Clone)]
pub struct IssueBuilder {
    title: String,
    description: String,
    category: IssueCategory,
    priority: IssuePriority,
    point: GeoPoint,
    address: String,
    reported_by: UserId,
    status: IssueStatus,
    assignee: Option<UserId>,
    upvotes: u32,
    age_hours: Option<i64>,
    comments: Vec<(UserId, String)>,
}

impl IssueBuilder {
    pub fn new() -> Self {
        Self {
            title: "Deep pothole".to_string(),
            description: "Opposite gate 3, dangerous for two-wheelers".to_string(),
            category: IssueCategory::Pothole,
            priority: IssuePriority::Normal,
            point: GeoPoint::new(77.2090, 28.6139).expect("default point is valid"),
            address: "Connaught Place, New Delhi".to_string(),
            reported_by: UserId::new(),
            status: IssueStatus::Reported,
            assignee: None,
            upvotes: 0,
            age_hours: None,
            comments: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: IssueCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn at(mut self, longitude: f64, latitude: f64) -> Self {
        self.point = GeoPoint::new(longitude, latitude).expect("builder point must be valid");
        self
    }

    pub fn at_point(mut self, point: GeoPoint) -> Self {
        self.point = point;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn reported_by(mut self, reporter: UserId) -> Self {
        self.reported_by = reporter;
        self
    }

    /// Bind the issue to an authority; a still-REPORTED issue becomes
    /// ASSIGNED, matching what the assignment flow does.
    pub fn assigned_to(mut self, authority: UserId) -> Self {
        self.assignee = Some(authority);
        if self.status == IssueStatus::Reported {
            self.status = IssueStatus::Assigned;
        }
        self
    }

    pub fn in_progress(mut self) -> Self {
        self.status = IssueStatus::InProgress;
        self
    }

    pub fn resolved(mut self) -> Self {
        self.status = IssueStatus::Resolved;
        self
    }

    pub fn with_upvotes(mut self, upvotes: u32) -> Self {
        self.upvotes = upvotes;
        self
    }

    /// Backdate the issue, shifting `created_at` and the initial audit entry.
    pub fn created_hours_ago(mut self, hours: i64) -> Self {
        self.age_hours = Some(hours);
        self
    }

    pub fn with_comment(mut self, author: UserId, text: impl Into<String>) -> Self {
        self.comments.push((author, text.into()));
        self
    }

    pub fn build(self) -> Issue {
        let mut issue = Issue::new(
            self.title,
            self.description,
            self.category,
            GeoLocation::new(self.point, self.address),
            self.reported_by,
        );
        issue.priority = self.priority;

        if let Some(hours) = self.age_hours {
            let created = Utc::now() - Duration::hours(hours);
            issue.created_at = created;
            issue.updated_at = created;
            issue.status_history[0].changed_at = created;
        }

        if self.status != IssueStatus::Reported {
            let authority = self.assignee.unwrap_or_else(UserId::new);
            issue
                .assign_to(authority, Utc::now())
                .expect("builder assigns before resolution");

            if self.status == IssueStatus::InProgress || self.status == IssueStatus::Resolved {
                if self.status == IssueStatus::InProgress {
                    issue
                        .apply_transition(
                            IssueStatus::InProgress,
                            authority,
                            Utc::now(),
                            None,
                            vec![],
                        )
                        .expect("ASSIGNED to IN_PROGRESS is a legal edge");
                } else {
                    issue
                        .apply_transition(IssueStatus::Resolved, authority, Utc::now(), None, vec![])
                        .expect("ASSIGNED to RESOLVED is a legal edge");
                }
            }
        }

        for _ in 0..self.upvotes {
            issue.record_upvote();
        }

        for (author, text) in self.comments {
            issue.add_comment(Comment::new(author, text, Utc::now()));
        }

        issue
    }
}

impl Default for IssueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating Notification test instances
#[derive(Clone)]
pub struct NotificationBuilder {
    recipient_id: UserId,
    title: String,
    message: String,
    link: String,
    read: bool,
}

impl NotificationBuilder {
    pub fn new() -> Self {
        Self {
            recipient_id: UserId::new(),
            title: "Status Updated: Deep pothole".to_string(),
            message: "Your report moved from Reported to Assigned.".to_string(),
            link: "/issues/test".to_string(),
            read: false,
        }
    }

    pub fn for_recipient(mut self, recipient_id: UserId) -> Self {
        self.recipient_id = recipient_id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn read(mut self) -> Self {
        self.read = true;
        self
    }

    pub fn build(self) -> Notification {
        let mut notification =
            Notification::new(self.recipient_id, self.title, self.message, self.link);
        if self.read {
            notification.mark_read();
        }
        notification
    }
}

impl Default for NotificationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_builder() {
        let user = UserBuilder::new()
            .with_name("Roads Dept")
            .authority()
            .build();

        assert_eq!(user.display_name, "Roads Dept");
        assert_eq!(user.role, UserRole::Authority);
        assert!(user.is_eligible_assignee());
    }

    #[test]
    fn test_suspended_authority_not_eligible() {
        let user = UserBuilder::new().authority().suspended().build();
        assert!(!user.is_eligible_assignee());
    }

    #[test]
    fn test_issue_builder_defaults_to_reported() {
        let issue = IssueBuilder::new().build();

        assert_eq!(issue.status, IssueStatus::Reported);
        assert_eq!(issue.status_history.len(), 1);
        assert!(issue.assigned_to.is_none());
    }

    #[test]
    fn test_issue_builder_walks_real_workflow() {
        let authority = UserId::new();
        let issue = IssueBuilder::new()
            .assigned_to(authority)
            .in_progress()
            .build();

        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.assigned_to, Some(authority));
        // REPORTED + ASSIGNED + IN_PROGRESS
        assert_eq!(issue.status_history.len(), 3);
    }

    #[test]
    fn test_issue_builder_backdates_audit_trail() {
        let issue = IssueBuilder::new().created_hours_ago(50).build();

        assert_eq!(issue.status_history[0].changed_at, issue.created_at);
        assert!(Utc::now() - issue.created_at >= Duration::hours(50));
    }

    #[test]
    fn test_notification_builder() {
        let recipient = UserId::new();
        let notification = NotificationBuilder::new()
            .for_recipient(recipient)
            .read()
            .build();

        assert_eq!(notification.recipient_id, recipient);
        assert!(notification.is_read);
    }
}
