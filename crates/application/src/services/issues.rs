//! Issue lifecycle operations
//!
//! Reporting, commenting, upvoting, and workflow transitions. Every mutation
//! follows the same shape: validate the request, authorize the actor, drive
//! the domain aggregate, persist through the store port, then hand the
//! resulting event to the notification service.

use crate::authz::{authorize, Action};
use crate::context::ActorContext;
use crate::ports::IssueStore;
use crate::services::NotificationService;
use crate::validation::{AddCommentRequest, ChangeStatusRequest, ReportIssueRequest, Validatable};
use chrono::Utc;
use civicwatch_domain::{
    Comment, CoreResult, GeoLocation, GeoPoint, Issue, IssueError, IssueEvent, IssueId,
    ValidationError,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Citizen-facing issue operations plus the authority/admin transition path.
pub struct IssueService {
    issues: Arc<dyn IssueStore>,
    notifications: Arc<NotificationService>,
}

impl IssueService {
    pub fn new(issues: Arc<dyn IssueStore>, notifications: Arc<NotificationService>) -> Self {
        Self {
            issues,
            notifications,
        }
    }

    /// File a new report. The issue starts REPORTED with a single audit
    /// entry; nobody is notified at creation time.
    #[instrument(skip(self, actor, request), fields(correlation_id = %actor.correlation_id))]
    pub async fn report(
        &self,
        actor: &ActorContext,
        request: ReportIssueRequest,
    ) -> CoreResult<Issue> {
        request.validate_all().ensure_valid()?;
        authorize(actor, &Action::ReportIssue)?;

        let point = GeoPoint::new(request.longitude, request.latitude)?;
        let images = parse_urls(&request.images)?;

        let mut issue = Issue::new(
            request.title.trim(),
            request.description.trim(),
            request.category,
            GeoLocation::new(point, request.address.trim()),
            actor.user_id,
        );
        issue.images = images;

        self.issues.create(&issue).await?;

        info!(
            issue_id = %issue.id,
            category = issue.category.as_str(),
            "Issue reported"
        );
        Ok(issue)
    }

    /// Fetch a single issue. Public: no actor required.
    #[instrument(skip(self))]
    pub async fn get(&self, id: IssueId) -> CoreResult<Issue> {
        self.issues
            .get(id)
            .await?
            .ok_or_else(|| IssueError::NotFound(id).into())
    }

    /// Post a comment. Allowed in every status, including RESOLVED.
    #[instrument(skip(self, actor, request), fields(correlation_id = %actor.correlation_id))]
    pub async fn comment(
        &self,
        actor: &ActorContext,
        issue_id: IssueId,
        request: AddCommentRequest,
    ) -> CoreResult<Issue> {
        request.validate_all().ensure_valid()?;
        authorize(actor, &Action::CommentOnIssue)?;

        let comment = Comment::new(actor.user_id, request.text.trim(), Utc::now());
        let comment_id = comment.id;
        let issue = self.issues.add_comment(issue_id, &comment).await?;

        info!(issue_id = %issue.id, comment_id = %comment_id, "Comment added");

        let event = IssueEvent::CommentAdded {
            issue_id: issue.id,
            title: issue.title.clone(),
            comment_id,
            author: actor.user_id,
            reported_by: issue.reported_by,
            assigned_to: issue.assigned_to,
        };
        self.dispatch(&event).await;

        Ok(issue)
    }

    /// Record an upvote. Allowed in every status; notifies nobody directly,
    /// though enough upvotes push a REPORTED issue into the critical tier.
    #[instrument(skip(self, actor), fields(correlation_id = %actor.correlation_id))]
    pub async fn upvote(&self, actor: &ActorContext, issue_id: IssueId) -> CoreResult<Issue> {
        authorize(actor, &Action::UpvoteIssue)?;

        let issue = self.issues.increment_upvotes(issue_id).await?;
        debug!(issue_id = %issue.id, upvotes = issue.upvotes, "Upvote recorded");
        Ok(issue)
    }

    /// Move an issue along the workflow. Only the assigned authority or an
    /// admin may do this; the write is conditional on the loaded version, so
    /// a concurrent transition surfaces as a conflict rather than a lost
    /// update.
    #[instrument(skip(self, actor, request), fields(correlation_id = %actor.correlation_id))]
    pub async fn change_status(
        &self,
        actor: &ActorContext,
        issue_id: IssueId,
        request: ChangeStatusRequest,
    ) -> CoreResult<Issue> {
        request.validate_all().ensure_valid()?;

        let mut issue = self.get(issue_id).await?;
        authorize(
            actor,
            &Action::UpdateIssueStatus {
                assigned_to: issue.assigned_to,
            },
        )?;

        let evidence = parse_urls(&request.evidence)?;
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);

        let old_status = issue.status;
        issue.apply_transition(request.status, actor.user_id, Utc::now(), notes, evidence)?;

        let stored = self.issues.update(&issue).await?;

        info!(
            issue_id = %stored.id,
            from = old_status.as_str(),
            to = stored.status.as_str(),
            "Issue status changed"
        );

        let event = IssueEvent::StatusChanged {
            issue_id: stored.id,
            title: stored.title.clone(),
            old_status,
            new_status: stored.status,
            changed_by: actor.user_id,
            reported_by: stored.reported_by,
        };
        self.dispatch(&event).await;

        Ok(stored)
    }

    /// Notification delivery never unwinds a committed mutation.
    async fn dispatch(&self, event: &IssueEvent) {
        if let Err(err) = self.notifications.dispatch(event).await {
            warn!(
                event_type = event.event_type(),
                issue_id = %event.issue_id(),
                error = %err,
                "Notification dispatch failed"
            );
        }
    }
}

fn parse_urls(raw: &[String]) -> CoreResult<Vec<Url>> {
    raw.iter()
        .map(|s| Url::parse(s).map_err(|_| ValidationError::InvalidUrl(s.clone()).into()))
        .collect()
}
