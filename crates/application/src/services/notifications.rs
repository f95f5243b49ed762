//! Notification dispatch and retrieval
//!
//! Delivery is durable-first: the store write happens before any live push,
//! so a recipient who was offline still finds the record on next poll. The
//! push leg is best-effort: transient faults get a bounded retry, and
//! exhaustion never fails the surrounding operation.

use crate::context::ActorContext;
use crate::ports::{NotificationStore, NotificationStream, RecipientChannel};
use civicwatch_common::retry::{retry_transient, RetryPolicy};
use civicwatch_domain::identifiers::NotificationId;
use civicwatch_domain::notification::Notification;
use civicwatch_domain::{CoreResult, IssueEvent, IssueId};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Server-enforced cap on notification retrieval.
pub const RECENT_NOTIFICATIONS_LIMIT: u32 = 50;

/// One pending notification produced by event fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub recipient_id: civicwatch_domain::identifiers::UserId,
    pub title: String,
    pub message: String,
    pub link: String,
}

/// Coordinates durable notification records and live pushes.
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    channel: Arc<dyn RecipientChannel>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, channel: Arc<dyn RecipientChannel>) -> Self {
        Self { store, channel }
    }

    /// Fan an event out to every affected recipient.
    ///
    /// Store failures propagate so the caller can log them; the issue
    /// mutation that produced the event has already committed and must not
    /// be unwound by delivery problems.
    #[instrument(skip(self, event), fields(event_type = event.event_type(), issue_id = %event.issue_id()))]
    pub async fn dispatch(&self, event: &IssueEvent) -> CoreResult<Vec<Notification>> {
        let drafts = compose(event);
        let mut delivered = Vec::with_capacity(drafts.len());

        for draft in drafts {
            delivered.push(self.notify(draft).await?);
        }

        info!(count = delivered.len(), "Notifications dispatched");
        Ok(delivered)
    }

    /// Write one durable record, then attempt the live push.
    pub async fn notify(&self, draft: NotificationDraft) -> CoreResult<Notification> {
        let notification = Notification::new(
            draft.recipient_id,
            draft.title,
            draft.message,
            draft.link,
        );

        self.store.append(&notification).await?;

        let push = retry_transient(&RetryPolicy::transient(), || {
            self.channel.publish(notification.recipient_id, &notification)
        })
        .await;

        if let Err(err) = push {
            warn!(
                notification_id = %notification.id,
                recipient_id = %notification.recipient_id,
                error = %err,
                "Live push failed; durable record stands"
            );
        }

        Ok(notification)
    }

    /// The actor's most recent notifications, newest first.
    #[instrument(skip(self, actor), fields(correlation_id = %actor.correlation_id))]
    pub async fn recent(&self, actor: &ActorContext) -> CoreResult<Vec<Notification>> {
        self.store
            .recent_for(actor.user_id, RECENT_NOTIFICATIONS_LIMIT)
            .await
    }

    #[instrument(skip(self, actor), fields(correlation_id = %actor.correlation_id))]
    pub async fn unread_count(&self, actor: &ActorContext) -> CoreResult<u64> {
        self.store.unread_count(actor.user_id).await
    }

    /// Mark one of the actor's notifications read.
    #[instrument(skip(self, actor), fields(correlation_id = %actor.correlation_id))]
    pub async fn mark_read(&self, actor: &ActorContext, id: NotificationId) -> CoreResult<()> {
        self.store.mark_read(actor.user_id, id).await
    }

    /// Mark everything the actor has as read.
    #[instrument(skip(self, actor), fields(correlation_id = %actor.correlation_id))]
    pub async fn mark_all_read(&self, actor: &ActorContext) -> CoreResult<()> {
        self.store.mark_all_read(actor.user_id).await
    }

    /// Open a live stream of the actor's pushes.
    pub async fn subscribe(&self, actor: &ActorContext) -> CoreResult<NotificationStream> {
        self.channel.subscribe(actor.user_id).await
    }
}

fn issue_link(issue_id: IssueId) -> String {
    format!("/issues/{}", issue_id)
}

/// Pure fan-out: which recipients hear about an event, and with what text.
pub fn compose(event: &IssueEvent) -> Vec<NotificationDraft> {
    let mut drafts = Vec::new();

    match event {
        IssueEvent::IssueAssigned {
            issue_id,
            title,
            authority_id,
            reported_by,
            previous_authority,
            ..
        } => {
            let link = issue_link(*issue_id);

            drafts.push(NotificationDraft {
                recipient_id: *reported_by,
                title: format!("Status Updated: {}", title),
                message: format!(
                    "Your report \"{}\" has been assigned to a municipal authority.",
                    title
                ),
                link: link.clone(),
            });

            drafts.push(NotificationDraft {
                recipient_id: *authority_id,
                title: format!("New Assignment: {}", title),
                message: format!("You have been assigned \"{}\".", title),
                link: link.clone(),
            });

            if let Some(previous) = previous_authority {
                if previous != authority_id {
                    drafts.push(NotificationDraft {
                        recipient_id: *previous,
                        title: format!("Assignment Changed: {}", title),
                        message: format!(
                            "\"{}\" has been reassigned to another authority.",
                            title
                        ),
                        link,
                    });
                }
            }
        }

        IssueEvent::StatusChanged {
            issue_id,
            title,
            old_status,
            new_status,
            reported_by,
            ..
        } => {
            drafts.push(NotificationDraft {
                recipient_id: *reported_by,
                title: format!("Status Updated: {}", title),
                message: format!(
                    "Your report \"{}\" moved from {} to {}.",
                    title,
                    old_status.display_name(),
                    new_status.display_name()
                ),
                link: issue_link(*issue_id),
            });
        }

        IssueEvent::CommentAdded {
            issue_id,
            title,
            author,
            reported_by,
            assigned_to,
            ..
        } => {
            let link = issue_link(*issue_id);

            if author != reported_by {
                drafts.push(NotificationDraft {
                    recipient_id: *reported_by,
                    title: format!("New Comment: {}", title),
                    message: format!("A new comment was posted on your report \"{}\".", title),
                    link: link.clone(),
                });
            }

            if let Some(assignee) = assigned_to {
                if assignee != author && assignee != reported_by {
                    drafts.push(NotificationDraft {
                        recipient_id: *assignee,
                        title: format!("New Comment: {}", title),
                        message: format!(
                            "A new comment was posted on \"{}\", which is assigned to you.",
                            title
                        ),
                        link,
                    });
                }
            }
        }
    }

    drafts
}
