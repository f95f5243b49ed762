//! Mock implementations of the delivery-side ports.
//!
//! Store-backed ports are exercised against the real in-memory backend; the
//! mocks here cover what that backend cannot show: capturing live pushes,
//! and forcing failures to prove durability ordering.

use async_trait::async_trait;
use civicwatch_application::ports::{NotificationStore, NotificationStream, RecipientChannel};
use civicwatch_domain::identifiers::{NotificationId, UserId};
use civicwatch_domain::notification::Notification;
use civicwatch_domain::{CoreResult, StoreError};
use parking_lot::RwLock;
use std::sync::Arc;

/// Records every live push; `subscribe` hands back an empty stream.
pub struct CapturingChannel {
    published: Arc<RwLock<Vec<Notification>>>,
}

impl CapturingChannel {
    pub fn new() -> Self {
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn published(&self) -> Vec<Notification> {
        self.published.read().clone()
    }

    pub fn published_for(&self, recipient_id: UserId) -> Vec<Notification> {
        self.published
            .read()
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect()
    }

    pub fn publish_count(&self) -> usize {
        self.published.read().len()
    }

    pub fn clear(&self) {
        self.published.write().clear();
    }
}

impl Default for CapturingChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipientChannel for CapturingChannel {
    async fn publish(&self, _recipient_id: UserId, notification: &Notification) -> CoreResult<()> {
        self.published.write().push(notification.clone());
        Ok(())
    }

    async fn subscribe(&self, _recipient_id: UserId) -> CoreResult<NotificationStream> {
        Ok(Box::pin(futures::stream::empty()))
    }
}

/// Every publish fails; proves that a dead push transport never unwinds the
/// operation that triggered it.
pub struct FailingChannel;

#[async_trait]
impl RecipientChannel for FailingChannel {
    async fn publish(&self, _recipient_id: UserId, _notification: &Notification) -> CoreResult<()> {
        Err(StoreError::Unavailable("forced failure".to_string()).into())
    }

    async fn subscribe(&self, _recipient_id: UserId) -> CoreResult<NotificationStream> {
        Err(StoreError::Unavailable("forced failure".to_string()).into())
    }
}

/// Every append fails; proves that the durable write happens before, and
/// gates, the live push.
pub struct FailingNotificationStore;

#[async_trait]
impl NotificationStore for FailingNotificationStore {
    async fn append(&self, _notification: &Notification) -> CoreResult<()> {
        Err(StoreError::Unavailable("forced failure".to_string()).into())
    }

    async fn recent_for(
        &self,
        _recipient_id: UserId,
        _limit: u32,
    ) -> CoreResult<Vec<Notification>> {
        Err(StoreError::Unavailable("forced failure".to_string()).into())
    }

    async fn unread_count(&self, _recipient_id: UserId) -> CoreResult<u64> {
        Err(StoreError::Unavailable("forced failure".to_string()).into())
    }

    async fn mark_read(&self, _recipient_id: UserId, _id: NotificationId) -> CoreResult<()> {
        Err(StoreError::Unavailable("forced failure".to_string()).into())
    }

    async fn mark_all_read(&self, _recipient_id: UserId) -> CoreResult<()> {
        Err(StoreError::Unavailable("forced failure".to_string()).into())
    }
}
