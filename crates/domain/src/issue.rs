//! Issue aggregate: the central entity of the civic reporting domain.
//!
//! An issue carries a validated location, a fixed-workflow status, an
//! append-only audit trail of every status change, and engagement signals
//! (comments, upvotes). The workflow is deliberately not configurable:
//! `REPORTED -> ASSIGNED -> IN_PROGRESS -> RESOLVED`, resolved terminal.

use crate::errors::IssueError;
use crate::geo::GeoLocation;
use crate::identifiers::{CommentId, IssueId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Upvote count at which a still-unhandled issue renders as critical.
pub const CRITICAL_UPVOTE_THRESHOLD: u32 = 30;

/// Age past which a still-unhandled issue renders as critical.
pub const CRITICAL_AGE_HOURS: i64 = 48;

/// Civic issue categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    StreetLight,
    Pothole,
    Garbage,
    Water,
    Road,
    Other,
}

impl IssueCategory {
    pub fn all() -> &'static [IssueCategory] {
        &[
            Self::StreetLight,
            Self::Pothole,
            Self::Garbage,
            Self::Water,
            Self::Road,
            Self::Other,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::StreetLight => "Street Light",
            Self::Pothole => "Pothole",
            Self::Garbage => "Garbage",
            Self::Water => "Water",
            Self::Road => "Road",
            Self::Other => "Other",
        }
    }

    /// Stable storage/wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StreetLight => "street_light",
            Self::Pothole => "pothole",
            Self::Garbage => "garbage",
            Self::Water => "water",
            Self::Road => "road",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for IssueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown issue category: {s}"))
    }
}

/// Issue priority, independent of workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    #[default]
    Normal,
    High,
}

impl IssuePriority {
    pub fn all() -> &'static [IssuePriority] {
        &[Self::Low, Self::Normal, Self::High]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::High => "High",
        }
    }

    /// Stable storage/wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl std::str::FromStr for IssuePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown issue priority: {s}"))
    }
}

/// Issue workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Reported,
    Assigned,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn all() -> &'static [IssueStatus] {
        &[
            Self::Reported,
            Self::Assigned,
            Self::InProgress,
            Self::Resolved,
        ]
    }

    /// The transition table. Forward-only; an authority may resolve straight
    /// from ASSIGNED, but nothing skips ASSIGNED itself.
    pub fn can_transition_to(&self, target: IssueStatus) -> bool {
        matches!(
            (self, target),
            (Self::Reported, Self::Assigned)
                | (Self::Assigned, Self::InProgress)
                | (Self::Assigned, Self::Resolved)
                | (Self::InProgress, Self::Resolved)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Reported => "Reported",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }

    /// Stable storage/wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown issue status: {s}"))
    }
}

/// One entry of the append-only audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: IssueStatus,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
}

/// A citizen or authority comment on an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: UserId, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::new(),
            author,
            text: text.into(),
            created_at: at,
        }
    }
}

/// Read-time display tier derived from engagement and age, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Standard,
    Critical,
}

/// The issue aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub location: GeoLocation,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub reported_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    pub images: Vec<Url>,
    pub upvotes: u32,
    pub comments: Vec<Comment>,
    pub status_history: Vec<StatusChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
    pub resolution_images: Vec<Url>,
    /// Optimistic-concurrency token, bumped by the store on every
    /// conditional update. Comment and upvote appends leave it untouched.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Create a freshly reported issue. The audit trail starts with a single
    /// REPORTED entry whose timestamp equals `created_at`.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: IssueCategory,
        location: GeoLocation,
        reported_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: IssueId::new(),
            title: title.into(),
            description: description.into(),
            category,
            location,
            status: IssueStatus::Reported,
            priority: IssuePriority::Normal,
            reported_by,
            assigned_to: None,
            images: Vec::new(),
            upvotes: 0,
            comments: Vec::new(),
            status_history: vec![StatusChange {
                status: IssueStatus::Reported,
                changed_by: reported_by,
                changed_at: now,
            }],
            resolution_notes: None,
            resolution_images: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Derived display tier: critical while still REPORTED and either heavily
    /// upvoted or left unhandled past the age threshold. Takes `now` so reads
    /// always reflect current time and tests can pin it.
    pub fn severity_at(&self, now: DateTime<Utc>) -> SeverityTier {
        if self.status == IssueStatus::Reported
            && (self.upvotes >= CRITICAL_UPVOTE_THRESHOLD
                || self.age_at(now) >= Duration::hours(CRITICAL_AGE_HOURS))
        {
            SeverityTier::Critical
        } else {
            SeverityTier::Standard
        }
    }

    /// Move the issue along a legal workflow edge and append the audit entry.
    ///
    /// Resolution notes and evidence images are only ever added, never
    /// overwritten with nothing: passing `None`/empty leaves existing values.
    pub fn apply_transition(
        &mut self,
        to: IssueStatus,
        changed_by: UserId,
        at: DateTime<Utc>,
        notes: Option<String>,
        evidence: Vec<Url>,
    ) -> Result<(), IssueError> {
        if self.status.is_terminal() {
            return Err(IssueError::TerminalState(self.id));
        }
        if !self.status.can_transition_to(to) {
            return Err(IssueError::IllegalTransition {
                from: self.status,
                to,
            });
        }

        self.status = to;
        if let Some(notes) = notes {
            self.resolution_notes = Some(notes);
        }
        self.resolution_images.extend(evidence);
        self.push_history(to, changed_by, at);
        Ok(())
    }

    /// Bind (or re-bind) the issue to an authority. First assignment moves
    /// REPORTED to ASSIGNED; reassignment while ASSIGNED/IN_PROGRESS keeps the
    /// current status and existing progress. Either way the audit trail gets
    /// an ASSIGNED-tagged entry with the authority as the changing party.
    pub fn assign_to(&mut self, authority_id: UserId, at: DateTime<Utc>) -> Result<(), IssueError> {
        if self.status.is_terminal() {
            return Err(IssueError::TerminalState(self.id));
        }

        if self.status == IssueStatus::Reported {
            self.status = IssueStatus::Assigned;
        }
        self.assigned_to = Some(authority_id);
        self.push_history(IssueStatus::Assigned, authority_id, at);
        Ok(())
    }

    /// Append a comment. Permitted in every status, including RESOLVED.
    pub fn add_comment(&mut self, comment: Comment) {
        self.updated_at = self.updated_at.max(comment.created_at);
        self.comments.push(comment);
    }

    /// Bump the engagement counter. Permitted in every status.
    pub fn record_upvote(&mut self) {
        self.upvotes += 1;
    }

    fn push_history(&mut self, status: IssueStatus, changed_by: UserId, at: DateTime<Utc>) {
        // The trail must stay monotonic even if the caller's clock regressed.
        let at = match self.status_history.last() {
            Some(last) => at.max(last.changed_at),
            None => at,
        };
        self.status_history.push(StatusChange {
            status,
            changed_by,
            changed_at: at,
        });
        self.updated_at = self.updated_at.max(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn test_location() -> GeoLocation {
        GeoLocation::new(
            GeoPoint::new(77.2090, 28.6139).unwrap(),
            "Connaught Place, New Delhi",
        )
    }

    fn test_issue() -> Issue {
        Issue::new(
            "Broken streetlight",
            "Pole dark for a week",
            IssueCategory::StreetLight,
            test_location(),
            UserId::new(),
        )
    }

    #[test]
    fn test_transition_table() {
        use IssueStatus::*;

        assert!(Reported.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(InProgress));
        assert!(Assigned.can_transition_to(Resolved));
        assert!(InProgress.can_transition_to(Resolved));

        // No backward edges
        assert!(!Assigned.can_transition_to(Reported));
        assert!(!InProgress.can_transition_to(Assigned));
        assert!(!Resolved.can_transition_to(InProgress));

        // Nothing skips ASSIGNED
        assert!(!Reported.can_transition_to(InProgress));
        assert!(!Reported.can_transition_to(Resolved));

        // Nothing leaves RESOLVED
        for target in IssueStatus::all() {
            assert!(!Resolved.can_transition_to(*target));
        }
    }

    #[test]
    fn test_new_issue_shape() {
        let reporter = UserId::new();
        let issue = Issue::new(
            "Pothole on main road",
            "Deep pothole near the crossing",
            IssueCategory::Pothole,
            test_location(),
            reporter,
        );

        assert_eq!(issue.status, IssueStatus::Reported);
        assert_eq!(issue.priority, IssuePriority::Normal);
        assert_eq!(issue.upvotes, 0);
        assert!(issue.assigned_to.is_none());
        assert_eq!(issue.status_history.len(), 1);
        assert_eq!(issue.status_history[0].status, IssueStatus::Reported);
        assert_eq!(issue.status_history[0].changed_by, reporter);
        assert_eq!(issue.status_history[0].changed_at, issue.created_at);
    }

    #[test]
    fn test_assign_then_progress_then_resolve() {
        let mut issue = test_issue();
        let authority = UserId::new();

        issue.assign_to(authority, Utc::now()).unwrap();
        assert_eq!(issue.status, IssueStatus::Assigned);
        assert_eq!(issue.assigned_to, Some(authority));
        assert_eq!(issue.status_history.len(), 2);

        issue
            .apply_transition(IssueStatus::InProgress, authority, Utc::now(), None, vec![])
            .unwrap();
        issue
            .apply_transition(
                IssueStatus::Resolved,
                authority,
                Utc::now(),
                Some("Fixed".to_string()),
                vec![],
            )
            .unwrap();

        assert_eq!(issue.status, IssueStatus::Resolved);
        assert_eq!(issue.resolution_notes.as_deref(), Some("Fixed"));
        assert_eq!(issue.status_history.len(), 4);
    }

    #[test]
    fn test_resolve_directly_from_assigned() {
        let mut issue = test_issue();
        let authority = UserId::new();
        issue.assign_to(authority, Utc::now()).unwrap();

        let result = issue.apply_transition(
            IssueStatus::Resolved,
            authority,
            Utc::now(),
            Some("Fixed".to_string()),
            vec![],
        );
        assert!(result.is_ok());
        assert_eq!(issue.status, IssueStatus::Resolved);
    }

    #[test]
    fn test_illegal_edge_rejected() {
        let mut issue = test_issue();
        let actor = UserId::new();

        let err = issue
            .apply_transition(IssueStatus::Resolved, actor, Utc::now(), None, vec![])
            .unwrap_err();
        assert!(matches!(err, IssueError::IllegalTransition { .. }));
        assert_eq!(issue.status, IssueStatus::Reported);
        assert_eq!(issue.status_history.len(), 1);
    }

    #[test]
    fn test_terminal_state_blocks_mutation() {
        let mut issue = test_issue();
        let authority = UserId::new();
        issue.assign_to(authority, Utc::now()).unwrap();
        issue
            .apply_transition(IssueStatus::Resolved, authority, Utc::now(), None, vec![])
            .unwrap();

        let err = issue
            .apply_transition(IssueStatus::InProgress, authority, Utc::now(), None, vec![])
            .unwrap_err();
        assert!(matches!(err, IssueError::TerminalState(_)));

        let err = issue.assign_to(UserId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, IssueError::TerminalState(_)));

        // Comments and upvotes remain open after resolution
        issue.add_comment(Comment::new(UserId::new(), "thanks!", Utc::now()));
        issue.record_upvote();
        assert_eq!(issue.comments.len(), 1);
        assert_eq!(issue.upvotes, 1);
    }

    #[test]
    fn test_reassignment_keeps_progress() {
        let mut issue = test_issue();
        let first = UserId::new();
        let second = UserId::new();

        issue.assign_to(first, Utc::now()).unwrap();
        issue
            .apply_transition(IssueStatus::InProgress, first, Utc::now(), None, vec![])
            .unwrap();

        issue.assign_to(second, Utc::now()).unwrap();
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.assigned_to, Some(second));

        // Reassignment entry is tagged ASSIGNED with the new authority
        let last = issue.status_history.last().unwrap();
        assert_eq!(last.status, IssueStatus::Assigned);
        assert_eq!(last.changed_by, second);
        assert_eq!(issue.status_history.len(), 4);
    }

    #[test]
    fn test_history_timestamps_monotonic() {
        let mut issue = test_issue();
        let authority = UserId::new();
        let past = issue.created_at - Duration::hours(1);

        // A regressed clock must not produce an out-of-order trail
        issue.assign_to(authority, past).unwrap();

        let timestamps: Vec<_> = issue.status_history.iter().map(|h| h.changed_at).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_severity_projection() {
        let now = Utc::now();
        let mut issue = test_issue();

        // Fresh and unloved: standard
        assert_eq!(issue.severity_at(now), SeverityTier::Standard);

        // 31 upvotes while REPORTED: critical regardless of age
        for _ in 0..31 {
            issue.record_upvote();
        }
        assert_eq!(issue.severity_at(now), SeverityTier::Critical);

        // Same engagement but already assigned: standard again
        issue.assign_to(UserId::new(), now).unwrap();
        assert_eq!(issue.severity_at(now), SeverityTier::Standard);
    }

    #[test]
    fn test_severity_age_rule() {
        let issue = test_issue();

        let just_under = issue.created_at + Duration::hours(CRITICAL_AGE_HOURS) - Duration::minutes(1);
        assert_eq!(issue.severity_at(just_under), SeverityTier::Standard);

        let just_over = issue.created_at + Duration::hours(CRITICAL_AGE_HOURS) + Duration::minutes(1);
        assert_eq!(issue.severity_at(just_over), SeverityTier::Critical);
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&IssueCategory::StreetLight).unwrap();
        assert_eq!(json, r#""street_light""#);
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);
    }

    #[test]
    fn test_enum_storage_names_round_trip() {
        for category in IssueCategory::all() {
            assert_eq!(category.as_str().parse::<IssueCategory>(), Ok(*category));
        }
        for status in IssueStatus::all() {
            assert_eq!(status.as_str().parse::<IssueStatus>(), Ok(*status));
        }
        for priority in IssuePriority::all() {
            assert_eq!(priority.as_str().parse::<IssuePriority>(), Ok(*priority));
        }
        assert!("flooded".parse::<IssueCategory>().is_err());
    }
}
