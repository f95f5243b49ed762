//! Read-side feeds
//!
//! Three distinct read patterns over the same issues: the citizen proximity
//! feed (distance-ordered), per-authority work queues, and the admin
//! oversight board with free-text search and a date window. All of them page
//! with clamped offset pagination and project issues into summaries with the
//! severity tier computed at read time.

use crate::authz::{authorize, Action};
use crate::context::ActorContext;
use crate::ports::{GeoStore, IssueFilter, IssueStore, NearbyFilter, NearbyIssue};
use crate::validation::{AdminListQuery, NearbyQuery, QueueQuery, Validatable};
use chrono::{DateTime, Utc};
use civicwatch_common::{Page, PageRequest};
use civicwatch_domain::{
    CoreResult, GeoLocation, GeoPoint, Issue, IssueCategory, IssueId, IssuePriority, IssueStatus,
    SeverityTier, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Feed-sized projection of an issue.
///
/// Comments, audit history, and resolution media stay behind the detail
/// endpoint; the feed carries what a list row renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: IssueId,
    pub title: String,
    pub category: IssueCategory,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    /// Computed against the request clock, never stored.
    pub severity: SeverityTier,
    pub location: GeoLocation,
    pub upvotes: u32,
    pub comment_count: usize,
    pub created_at: DateTime<Utc>,
}

impl IssueSummary {
    pub fn from_issue(issue: &Issue, now: DateTime<Utc>) -> Self {
        Self {
            id: issue.id,
            title: issue.title.clone(),
            category: issue.category,
            status: issue.status,
            priority: issue.priority,
            severity: issue.severity_at(now),
            location: issue.location.clone(),
            upvotes: issue.upvotes,
            comment_count: issue.comments.len(),
            created_at: issue.created_at,
        }
    }
}

/// A summary plus its distance from the query origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyIssueSummary {
    #[serde(flatten)]
    pub summary: IssueSummary,
    pub distance_meters: f64,
}

impl NearbyIssueSummary {
    fn from_near(near: NearbyIssue, now: DateTime<Utc>) -> Self {
        Self {
            summary: IssueSummary::from_issue(&near.issue, now),
            distance_meters: near.distance_meters,
        }
    }
}

/// Query side of the core: proximity feed, work queues, oversight board.
pub struct FeedService {
    issues: Arc<dyn IssueStore>,
    geo: Arc<dyn GeoStore>,
}

impl FeedService {
    pub fn new(issues: Arc<dyn IssueStore>, geo: Arc<dyn GeoStore>) -> Self {
        Self { issues, geo }
    }

    /// Issues near a point, closest first. Public: no actor required. An
    /// invalid origin fails fast before any store work.
    #[instrument(skip(self, query, page))]
    pub async fn nearby(
        &self,
        query: &NearbyQuery,
        page: PageRequest,
    ) -> CoreResult<Page<NearbyIssueSummary>> {
        query.validate_all().ensure_valid()?;

        let origin = GeoPoint::new(query.lng, query.lat)?;
        let filter = NearbyFilter {
            category: query.category,
            status: query.status,
        };

        let results = self
            .geo
            .query_near(origin, query.effective_radius(), &filter, page.sanitized())
            .await?;

        let now = Utc::now();
        Ok(results.map(|near| NearbyIssueSummary::from_near(near, now)))
    }

    /// The actor's own reports, newest first.
    #[instrument(skip(self, actor, page), fields(correlation_id = %actor.correlation_id))]
    pub async fn my_reports(
        &self,
        actor: &ActorContext,
        page: PageRequest,
    ) -> CoreResult<Page<IssueSummary>> {
        let filter = IssueFilter {
            reported_by: Some(actor.user_id),
            ..IssueFilter::default()
        };

        let issues = self.issues.list(&filter, page.sanitized()).await?;
        Ok(summarize(issues))
    }

    /// One authority's work queue. Authorities see their own; admins see any.
    #[instrument(skip(self, actor, query, page), fields(correlation_id = %actor.correlation_id))]
    pub async fn authority_queue(
        &self,
        actor: &ActorContext,
        authority_id: UserId,
        query: &QueueQuery,
        page: PageRequest,
    ) -> CoreResult<Page<IssueSummary>> {
        authorize(actor, &Action::ViewAuthorityQueue { authority_id })?;

        let issues = self
            .issues
            .list(&query.to_filter(authority_id), page.sanitized())
            .await?;
        Ok(summarize(issues))
    }

    /// The admin oversight board: every issue, with search and date window.
    #[instrument(skip(self, actor, query, page), fields(correlation_id = %actor.correlation_id))]
    pub async fn admin_board(
        &self,
        actor: &ActorContext,
        query: &AdminListQuery,
        page: PageRequest,
    ) -> CoreResult<Page<IssueSummary>> {
        query.validate_all().ensure_valid()?;
        authorize(actor, &Action::ViewAdminBoard)?;

        let issues = self.issues.list(&query.to_filter(), page.sanitized()).await?;
        Ok(summarize(issues))
    }
}

fn summarize(issues: Page<Issue>) -> Page<IssueSummary> {
    let now = Utc::now();
    issues.map(|issue| IssueSummary::from_issue(&issue, now))
}
