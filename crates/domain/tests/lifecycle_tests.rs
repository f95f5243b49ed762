//! Tests for the issue workflow state machine and audit trail
//!
//! Covers the full REPORTED -> ASSIGNED -> IN_PROGRESS -> RESOLVED walk,
//! terminal-state enforcement, and the read-time severity projection.

use chrono::{Duration, Utc};
use civicwatch_domain::{
    errors::IssueError,
    geo::{GeoLocation, GeoPoint},
    identifiers::UserId,
    issue::{Comment, Issue, IssueCategory, IssuePriority, IssueStatus, SeverityTier},
};

fn delhi_location() -> GeoLocation {
    GeoLocation::new(
        GeoPoint::new(77.2090, 28.6139).unwrap(),
        "Connaught Place, New Delhi",
    )
}

fn reported_issue() -> Issue {
    Issue::new(
        "Deep pothole",
        "Opposite gate 3, dangerous for two-wheelers",
        IssueCategory::Pothole,
        delhi_location(),
        UserId::new(),
    )
}

// ============================================================================
// Status machine
// ============================================================================

#[test]
fn test_reported_transitions() {
    let reported = IssueStatus::Reported;

    assert!(reported.can_transition_to(IssueStatus::Assigned));

    // Nothing skips ASSIGNED
    assert!(!reported.can_transition_to(IssueStatus::InProgress));
    assert!(!reported.can_transition_to(IssueStatus::Resolved));
    assert!(!reported.can_transition_to(IssueStatus::Reported));
}

#[test]
fn test_assigned_transitions() {
    let assigned = IssueStatus::Assigned;

    assert!(assigned.can_transition_to(IssueStatus::InProgress));
    assert!(assigned.can_transition_to(IssueStatus::Resolved));

    // No backward edges
    assert!(!assigned.can_transition_to(IssueStatus::Reported));
    assert!(!assigned.can_transition_to(IssueStatus::Assigned));
}

#[test]
fn test_in_progress_transitions() {
    let in_progress = IssueStatus::InProgress;

    assert!(in_progress.can_transition_to(IssueStatus::Resolved));

    assert!(!in_progress.can_transition_to(IssueStatus::Reported));
    assert!(!in_progress.can_transition_to(IssueStatus::Assigned));
    assert!(!in_progress.can_transition_to(IssueStatus::InProgress));
}

#[test]
fn test_resolved_is_terminal() {
    let resolved = IssueStatus::Resolved;

    assert!(resolved.is_terminal());
    for target in IssueStatus::all() {
        assert!(
            !resolved.can_transition_to(*target),
            "RESOLVED must not transition to {target:?}"
        );
    }
}

#[test]
fn test_status_serialization() {
    let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
    assert_eq!(json, "\"in_progress\"");

    let deserialized: IssueStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, IssueStatus::InProgress);
}

// ============================================================================
// Full workflow walk
// ============================================================================

#[test]
fn test_complete_lifecycle() {
    let mut issue = reported_issue();
    let authority = UserId::new();

    assert_eq!(issue.status, IssueStatus::Reported);
    assert_eq!(issue.priority, IssuePriority::Normal);
    assert_eq!(issue.status_history.len(), 1);

    issue.assign_to(authority, Utc::now()).unwrap();
    assert_eq!(issue.status, IssueStatus::Assigned);
    assert_eq!(issue.assigned_to, Some(authority));

    issue
        .apply_transition(IssueStatus::InProgress, authority, Utc::now(), None, vec![])
        .unwrap();

    issue
        .apply_transition(
            IssueStatus::Resolved,
            authority,
            Utc::now(),
            Some("Patched with cold mix".to_string()),
            vec!["https://storage.example.com/evidence/after.jpg"
                .parse()
                .unwrap()],
        )
        .unwrap();

    assert_eq!(issue.status, IssueStatus::Resolved);
    assert_eq!(issue.resolution_notes.as_deref(), Some("Patched with cold mix"));
    assert_eq!(issue.resolution_images.len(), 1);

    // REPORTED, ASSIGNED, IN_PROGRESS, RESOLVED
    assert_eq!(issue.status_history.len(), 4);
    let statuses: Vec<_> = issue.status_history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            IssueStatus::Reported,
            IssueStatus::Assigned,
            IssueStatus::InProgress,
            IssueStatus::Resolved,
        ]
    );
}

#[test]
fn test_audit_trail_invariants() {
    let mut issue = reported_issue();
    let authority = UserId::new();

    issue.assign_to(authority, Utc::now()).unwrap();
    issue
        .apply_transition(IssueStatus::InProgress, authority, Utc::now(), None, vec![])
        .unwrap();
    issue.assign_to(UserId::new(), Utc::now()).unwrap();

    // Always at least one entry, timestamps never decrease
    assert!(!issue.status_history.is_empty());
    let stamps: Vec<_> = issue.status_history.iter().map(|h| h.changed_at).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_terminal_state_rejects_all_mutation() {
    let mut issue = reported_issue();
    let authority = UserId::new();
    issue.assign_to(authority, Utc::now()).unwrap();
    issue
        .apply_transition(
            IssueStatus::Resolved,
            authority,
            Utc::now(),
            Some("Fixed".to_string()),
            vec![],
        )
        .unwrap();

    let history_len = issue.status_history.len();
    let notes = issue.resolution_notes.clone();

    assert!(matches!(
        issue
            .apply_transition(IssueStatus::InProgress, authority, Utc::now(), None, vec![])
            .unwrap_err(),
        IssueError::TerminalState(_)
    ));
    assert!(matches!(
        issue.assign_to(UserId::new(), Utc::now()).unwrap_err(),
        IssueError::TerminalState(_)
    ));

    // Rejected calls must leave no trace
    assert_eq!(issue.status, IssueStatus::Resolved);
    assert_eq!(issue.status_history.len(), history_len);
    assert_eq!(issue.resolution_notes, notes);
    assert_eq!(issue.assigned_to, Some(authority));
}

#[test]
fn test_comments_and_upvotes_survive_resolution() {
    let mut issue = reported_issue();
    let authority = UserId::new();
    issue.assign_to(authority, Utc::now()).unwrap();
    issue
        .apply_transition(IssueStatus::Resolved, authority, Utc::now(), None, vec![])
        .unwrap();

    issue.add_comment(Comment::new(
        UserId::new(),
        "Confirmed fixed, thank you",
        Utc::now(),
    ));
    issue.record_upvote();

    assert_eq!(issue.comments.len(), 1);
    assert_eq!(issue.upvotes, 1);
    assert_eq!(issue.status, IssueStatus::Resolved);
}

// ============================================================================
// Severity projection
// ============================================================================

#[test]
fn test_upvote_threshold_escalates_reported_issue() {
    let mut issue = reported_issue();
    for _ in 0..31 {
        issue.record_upvote();
    }

    // One hour old, still REPORTED, 31 upvotes: critical
    let now = issue.created_at + Duration::hours(1);
    assert_eq!(issue.severity_at(now), SeverityTier::Critical);
}

#[test]
fn test_age_threshold_escalates_reported_issue() {
    let issue = reported_issue();

    let now = issue.created_at + Duration::hours(49);
    assert_eq!(issue.severity_at(now), SeverityTier::Critical);
}

#[test]
fn test_assigned_issue_never_critical() {
    let mut issue = reported_issue();
    for _ in 0..100 {
        issue.record_upvote();
    }
    issue.assign_to(UserId::new(), Utc::now()).unwrap();

    let now = issue.created_at + Duration::hours(100);
    assert_eq!(issue.severity_at(now), SeverityTier::Standard);
}

#[test]
fn test_fresh_quiet_issue_is_standard() {
    let issue = reported_issue();
    let now = issue.created_at + Duration::minutes(5);
    assert_eq!(issue.severity_at(now), SeverityTier::Standard);
}
