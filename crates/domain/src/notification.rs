//! Notification records: durable, per-recipient, disposable.
//!
//! A notification is written before any live push is attempted, so a
//! recipient who was offline still finds it on next poll. Only the recipient
//! may mutate it, and only by marking it read.

use crate::identifiers::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durable notification record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub title: String,
    pub message: String,
    /// Deep link into the client, e.g. `/issues/{id}`
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_id,
            title: title.into(),
            message: message.into(),
            link: link.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Mark read. Idempotent: re-marking is a no-op.
    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}
