//! In-memory backend for local development and tests.
//!
//! One struct implements every storage port over a single `RwLock`, so a
//! binary can run with zero external services. Semantics mirror the
//! Postgres stores exactly: conditional updates, append-without-version
//! comments and upvotes, and the same ordering rules. The integration
//! suite runs the same scenarios against both backends.

use async_trait::async_trait;
use civicwatch_application::{
    GeoStore, IssueFilter, IssueStore, NearbyFilter, NearbyIssue, NotificationStore, UserDirectory,
};
use civicwatch_common::pagination::{Page, PageRequest};
use civicwatch_domain::{
    Comment, CoreResult, GeoPoint, Issue, IssueError, IssueId, Notification, NotificationError,
    NotificationId, StoreError, User, UserId,
};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Every storage port over one in-process map.
///
/// Clone an `Arc<InMemoryBackend>` once per port when wiring services:
///
/// ```rust,ignore
/// let backend = Arc::new(InMemoryBackend::new());
/// let issues: Arc<dyn IssueStore> = backend.clone();
/// let geo: Arc<dyn GeoStore> = backend.clone();
/// ```
#[derive(Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    issues: HashMap<IssueId, Issue>,
    users: HashMap<UserId, User>,
    notifications: HashMap<UserId, Vec<Notification>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of issues currently held, for test assertions.
    pub fn issue_count(&self) -> usize {
        self.state.read().issues.len()
    }
}

#[async_trait]
impl IssueStore for InMemoryBackend {
    async fn create(&self, issue: &Issue) -> CoreResult<()> {
        let mut state = self.state.write();
        if state.issues.contains_key(&issue.id) {
            return Err(
                StoreError::QueryFailed(format!("issue {} already exists", issue.id)).into(),
            );
        }
        state.issues.insert(issue.id, issue.clone());
        Ok(())
    }

    async fn get(&self, id: IssueId) -> CoreResult<Option<Issue>> {
        Ok(self.state.read().issues.get(&id).cloned())
    }

    async fn update(&self, issue: &Issue) -> CoreResult<Issue> {
        let mut state = self.state.write();
        let stored = state
            .issues
            .get_mut(&issue.id)
            .ok_or(IssueError::NotFound(issue.id))?;

        if stored.version != issue.version {
            return Err(StoreError::Conflict {
                issue_id: issue.id,
                expected_version: issue.version,
            }
            .into());
        }

        // Comments and upvotes are owned by their append operations, which
        // carry no version precondition. Appends that landed since the
        // caller's load must survive this write.
        let mut next = issue.clone();
        next.comments = stored.comments.clone();
        next.upvotes = stored.upvotes;
        next.updated_at = next.updated_at.max(stored.updated_at);
        next.version = issue.version + 1;
        *stored = next.clone();
        Ok(next)
    }

    async fn add_comment(&self, issue_id: IssueId, comment: &Comment) -> CoreResult<Issue> {
        let mut state = self.state.write();
        let stored = state
            .issues
            .get_mut(&issue_id)
            .ok_or(IssueError::NotFound(issue_id))?;

        stored.add_comment(comment.clone());
        Ok(stored.clone())
    }

    async fn increment_upvotes(&self, issue_id: IssueId) -> CoreResult<Issue> {
        let mut state = self.state.write();
        let stored = state
            .issues
            .get_mut(&issue_id)
            .ok_or(IssueError::NotFound(issue_id))?;

        stored.record_upvote();
        Ok(stored.clone())
    }

    async fn list(&self, filter: &IssueFilter, page: PageRequest) -> CoreResult<Page<Issue>> {
        let state = self.state.read();

        let mut matched: Vec<Issue> = state
            .issues
            .values()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(Page::new(items, page, total))
    }
}

#[async_trait]
impl GeoStore for InMemoryBackend {
    async fn query_near(
        &self,
        origin: GeoPoint,
        radius_meters: f64,
        filter: &NearbyFilter,
        page: PageRequest,
    ) -> CoreResult<Page<NearbyIssue>> {
        let state = self.state.read();

        let mut hits: Vec<NearbyIssue> = state
            .issues
            .values()
            .filter(|issue| filter.matches(issue))
            .filter_map(|issue| {
                let distance_meters = origin.distance_meters(&issue.location.point);
                (distance_meters <= radius_meters).then(|| NearbyIssue {
                    issue: issue.clone(),
                    distance_meters,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance_meters
                .total_cmp(&b.distance_meters)
                .then_with(|| b.issue.created_at.cmp(&a.issue.created_at))
        });

        let total = hits.len() as u64;
        let items = hits
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(Page::new(items, page, total))
    }
}

#[async_trait]
impl UserDirectory for InMemoryBackend {
    async fn get(&self, id: UserId) -> CoreResult<Option<User>> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn upsert(&self, user: &User) -> CoreResult<()> {
        self.state.write().users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for InMemoryBackend {
    async fn append(&self, notification: &Notification) -> CoreResult<()> {
        self.state
            .write()
            .notifications
            .entry(notification.recipient_id)
            .or_default()
            .push(notification.clone());
        Ok(())
    }

    async fn recent_for(&self, recipient_id: UserId, limit: u32) -> CoreResult<Vec<Notification>> {
        let state = self.state.read();
        let Some(records) = state.notifications.get(&recipient_id) else {
            return Ok(Vec::new());
        };

        // Appended in arrival order, so newest-first is a reverse walk.
        Ok(records
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, recipient_id: UserId) -> CoreResult<u64> {
        let state = self.state.read();
        Ok(state
            .notifications
            .get(&recipient_id)
            .map_or(0, |records| records.iter().filter(|n| !n.is_read).count() as u64))
    }

    async fn mark_read(&self, recipient_id: UserId, id: NotificationId) -> CoreResult<()> {
        let mut state = self.state.write();
        let record = state
            .notifications
            .get_mut(&recipient_id)
            .and_then(|records| records.iter_mut().find(|n| n.id == id))
            .ok_or(NotificationError::NotFound(id))?;

        record.mark_read();
        Ok(())
    }

    async fn mark_all_read(&self, recipient_id: UserId) -> CoreResult<()> {
        let mut state = self.state.write();
        if let Some(records) = state.notifications.get_mut(&recipient_id) {
            for record in records.iter_mut() {
                record.mark_read();
            }
        }
        Ok(())
    }
}
