//! Storage and delivery ports implemented by the infrastructure layer.
//!
//! Services depend on these traits only; Postgres and the in-memory backend
//! both implement them. The filter types carry their own pure matching logic
//! so every backend applies identical semantics.

use async_trait::async_trait;
use civicwatch_common::pagination::{DateRange, Page, PageRequest};
use civicwatch_domain::{
    Comment, CoreResult, GeoPoint, Issue, IssueCategory, IssueId, IssuePriority, IssueStatus,
    Notification, NotificationId, User, UserId,
};
use futures::Stream;
use std::pin::Pin;

/// Live notification feed for one subscribed recipient.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Notification> + Send>>;

/// Search terms this short are additionally matched as an exact id suffix,
/// so operators can paste a truncated id shown in the UI.
pub const ID_SUFFIX_SEARCH_MAX_LEN: usize = 6;

/// Filters for issue list queries (authority queue, admin table).
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<IssueCategory>,
    pub priority: Option<IssuePriority>,
    pub assigned_to: Option<UserId>,
    pub reported_by: Option<UserId>,
    /// Case-insensitive substring over title/description/category
    pub search: Option<String>,
    pub created: DateRange,
}

impl IssueFilter {
    /// Whether an issue satisfies every populated filter field.
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(status) = self.status {
            if issue.status != status {
                return false;
            }
        }
        if let Some(category) = self.category {
            if issue.category != category {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if issue.priority != priority {
                return false;
            }
        }
        if let Some(assigned_to) = self.assigned_to {
            if issue.assigned_to != Some(assigned_to) {
                return false;
            }
        }
        if let Some(reported_by) = self.reported_by {
            if issue.reported_by != reported_by {
                return false;
            }
        }
        if !self.created.contains(&issue.created_at) {
            return false;
        }
        if let Some(term) = self.search.as_deref() {
            if !Self::matches_search(issue, term) {
                return false;
            }
        }
        true
    }

    fn matches_search(issue: &Issue, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        if issue.title.to_lowercase().contains(&term)
            || issue.description.to_lowercase().contains(&term)
            || issue.category.as_str().contains(&term)
        {
            return true;
        }

        term.len() <= ID_SUFFIX_SEARCH_MAX_LEN && issue.id.to_string().ends_with(&term)
    }
}

/// Filter for proximity queries.
#[derive(Debug, Clone, Default)]
pub struct NearbyFilter {
    pub category: Option<IssueCategory>,
    pub status: Option<IssueStatus>,
}

impl NearbyFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(category) = self.category {
            if issue.category != category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if issue.status != status {
                return false;
            }
        }
        true
    }
}

/// A proximity query hit with its distance from the origin.
#[derive(Debug, Clone)]
pub struct NearbyIssue {
    pub issue: Issue,
    pub distance_meters: f64,
}

/// Issue persistence, including the spatial index.
///
/// Creating an issue writes the entity and its index entry as one unit:
/// there is never a state where an issue is readable by id but invisible to
/// proximity queries, or the reverse.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Persist a new issue together with its spatial index entry.
    async fn create(&self, issue: &Issue) -> CoreResult<()>;

    async fn get(&self, id: IssueId) -> CoreResult<Option<Issue>>;

    /// Conditional write: persists the issue's workflow fields (status,
    /// priority, assignee, history, resolution) only if the stored version
    /// still equals `issue.version` (the version the caller loaded), then
    /// bumps it. A losing writer gets `StoreError::Conflict` and must
    /// re-read before trying again. Comment and upvote appends that landed
    /// since the load are preserved, never overwritten. Returns the stored
    /// issue.
    async fn update(&self, issue: &Issue) -> CoreResult<Issue>;

    /// Append a comment without a version precondition; appends never race
    /// destructively. Returns the updated issue.
    async fn add_comment(&self, issue_id: IssueId, comment: &Comment) -> CoreResult<Issue>;

    /// Atomic upvote increment without a version precondition. Returns the
    /// updated issue.
    async fn increment_upvotes(&self, issue_id: IssueId) -> CoreResult<Issue>;

    /// Filtered listing ordered by `created_at` descending.
    async fn list(&self, filter: &IssueFilter, page: PageRequest) -> CoreResult<Page<Issue>>;
}

/// Spatial read path: "issues within radius R of point P".
#[async_trait]
pub trait GeoStore: Send + Sync {
    /// Issues within `radius_meters` of `origin`, ordered by ascending
    /// spherical distance with ties broken by most recent `created_at`.
    async fn query_near(
        &self,
        origin: GeoPoint,
        radius_meters: f64,
        filter: &NearbyFilter,
        page: PageRequest,
    ) -> CoreResult<Page<NearbyIssue>>;
}

/// Minimal user roster the core keeps for assignment eligibility checks.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, id: UserId) -> CoreResult<Option<User>>;

    /// Insert or refresh a roster entry (identity sync, seeding).
    async fn upsert(&self, user: &User) -> CoreResult<()>;
}

/// Durable notification records, per recipient.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, notification: &Notification) -> CoreResult<()>;

    /// Most recent first, capped at `limit`.
    async fn recent_for(&self, recipient_id: UserId, limit: u32) -> CoreResult<Vec<Notification>>;

    async fn unread_count(&self, recipient_id: UserId) -> CoreResult<u64>;

    /// Idempotent: marking an already-read notification succeeds. An id that
    /// does not exist for this recipient is `NotificationError::NotFound`.
    async fn mark_read(&self, recipient_id: UserId, id: NotificationId) -> CoreResult<()>;

    /// Idempotent: a second call leaves state identical to the first.
    async fn mark_all_read(&self, recipient_id: UserId) -> CoreResult<()>;
}

/// Live push channel, grouped per recipient.
///
/// Transport is an implementation choice (in-process broadcast, Redis
/// pub/sub); the dispatcher only needs publish and subscribe by recipient id.
/// A publish with no subscribed session is dropped, not an error: the durable
/// record is the source of truth.
#[async_trait]
pub trait RecipientChannel: Send + Sync {
    /// Best-effort push to every session subscribed to this recipient.
    async fn publish(&self, recipient_id: UserId, notification: &Notification) -> CoreResult<()>;

    /// Open a live stream of this recipient's pushes.
    async fn subscribe(&self, recipient_id: UserId) -> CoreResult<NotificationStream>;
}
