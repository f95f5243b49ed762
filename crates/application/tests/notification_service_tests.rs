//! Tests for notification delivery and retrieval.
//!
//! The delivery contract under test: the durable store write comes first,
//! a failed write suppresses the push, and a failed push never surfaces to
//! the caller. Retrieval is always scoped to the acting recipient.

use std::sync::Arc;
use std::time::Duration;

use civicwatch_application::{
    ActorContext, NotificationDraft, NotificationService, NotificationStore,
    RECENT_NOTIFICATIONS_LIMIT,
};
use civicwatch_domain::{IssueEvent, IssueId, IssueStatus, Notification, UserId};
use civicwatch_infrastructure::{InMemoryBackend, InProcessRecipientChannel};
use civicwatch_testing::{CapturingChannel, FailingChannel, FailingNotificationStore};
use futures::StreamExt;

fn service_with_capture() -> (Arc<InMemoryBackend>, Arc<CapturingChannel>, NotificationService) {
    let backend = Arc::new(InMemoryBackend::new());
    let channel = Arc::new(CapturingChannel::new());
    let service = NotificationService::new(backend.clone(), channel.clone());
    (backend, channel, service)
}

fn draft_for(recipient: UserId, title: &str) -> NotificationDraft {
    NotificationDraft {
        recipient_id: recipient,
        title: title.to_string(),
        message: "Your report \"Streetlight out\" moved from Reported to Assigned.".to_string(),
        link: "/issues/0".to_string(),
    }
}

#[tokio::test]
async fn test_notify_writes_durably_then_pushes() {
    let (backend, channel, service) = service_with_capture();
    let recipient = UserId::new();

    let delivered = service
        .notify(draft_for(recipient, "Status Updated: Streetlight out"))
        .await
        .unwrap();

    assert_eq!(delivered.recipient_id, recipient);
    assert!(!delivered.is_read);

    let durable = backend.recent_for(recipient, 10).await.unwrap();
    assert_eq!(durable.len(), 1);
    assert_eq!(durable[0].id, delivered.id);

    let pushed = channel.published_for(recipient);
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].id, delivered.id);
}

#[tokio::test]
async fn test_store_failure_gates_the_push() {
    let channel = Arc::new(CapturingChannel::new());
    let service = NotificationService::new(Arc::new(FailingNotificationStore), channel.clone());

    let err = service
        .notify(draft_for(UserId::new(), "Status Updated: Streetlight out"))
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), 503);
    assert!(err.is_retryable());
    // No durable record means no push either.
    assert_eq!(channel.publish_count(), 0);
}

#[tokio::test]
async fn test_push_failure_leaves_the_durable_record() {
    let backend = Arc::new(InMemoryBackend::new());
    let service = NotificationService::new(backend.clone(), Arc::new(FailingChannel));
    let recipient = UserId::new();

    let delivered = service
        .notify(draft_for(recipient, "Status Updated: Streetlight out"))
        .await
        .unwrap();

    let actor = ActorContext::citizen(recipient);
    let recent = service.recent(&actor).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, delivered.id);
}

#[tokio::test]
async fn test_dispatch_composes_and_delivers() {
    let (backend, channel, service) = service_with_capture();
    let reporter = UserId::new();
    let issue_id = IssueId::new();
    let event = IssueEvent::StatusChanged {
        issue_id,
        title: "Collapsed manhole cover".to_string(),
        old_status: IssueStatus::Assigned,
        new_status: IssueStatus::InProgress,
        changed_by: UserId::new(),
        reported_by: reporter,
    };

    let delivered = service.dispatch(&event).await.unwrap();

    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].recipient_id, reporter);
    assert_eq!(delivered[0].link, format!("/issues/{}", issue_id));
    assert_eq!(backend.unread_count(reporter).await.unwrap(), 1);
    assert_eq!(channel.publish_count(), 1);
}

#[tokio::test]
async fn test_recent_is_capped_at_the_server_limit() {
    let (backend, _, service) = service_with_capture();
    let recipient = UserId::new();

    // Backdated records with distinct timestamps, oldest first.
    let base = chrono::Utc::now() - chrono::Duration::seconds(100);
    for i in 0..55 {
        let mut notification = Notification::new(
            recipient,
            format!("Status Updated: pole {i}"),
            "Your report moved.",
            "/issues/0",
        );
        notification.created_at = base + chrono::Duration::seconds(i);
        backend.append(&notification).await.unwrap();
    }

    let actor = ActorContext::citizen(recipient);
    let recent = service.recent(&actor).await.unwrap();

    assert_eq!(recent.len(), RECENT_NOTIFICATIONS_LIMIT as usize);
    assert_eq!(recent[0].title, "Status Updated: pole 54");
    assert_eq!(recent[49].title, "Status Updated: pole 5");
}

#[tokio::test]
async fn test_read_state_is_scoped_to_the_actor() {
    let (_, _, service) = service_with_capture();
    let recipient = UserId::new();
    let bystander = UserId::new();

    let first = service
        .notify(draft_for(recipient, "Status Updated: pole 1"))
        .await
        .unwrap();
    service
        .notify(draft_for(recipient, "Status Updated: pole 2"))
        .await
        .unwrap();
    let theirs = service
        .notify(draft_for(bystander, "New Assignment: pole 3"))
        .await
        .unwrap();

    let actor = ActorContext::citizen(recipient);
    assert_eq!(service.unread_count(&actor).await.unwrap(), 2);

    service.mark_read(&actor, first.id).await.unwrap();
    assert_eq!(service.unread_count(&actor).await.unwrap(), 1);

    // Someone else's notification is invisible to this actor.
    let err = service.mark_read(&actor, theirs.id).await.unwrap_err();
    assert_eq!(err.error_code(), "NOTIFICATION_NOT_FOUND");
    assert_eq!(err.http_status(), 404);

    service.mark_all_read(&actor).await.unwrap();
    assert_eq!(service.unread_count(&actor).await.unwrap(), 0);

    let bystander_actor = ActorContext::citizen(bystander);
    assert_eq!(service.unread_count(&bystander_actor).await.unwrap(), 1);
}

#[tokio::test]
async fn test_subscribe_receives_live_pushes() {
    let backend = Arc::new(InMemoryBackend::new());
    let channel = Arc::new(InProcessRecipientChannel::new());
    let service = NotificationService::new(backend, channel);
    let recipient = UserId::new();
    let actor = ActorContext::citizen(recipient);

    let mut stream = service.subscribe(&actor).await.unwrap();
    let delivered = service
        .notify(draft_for(recipient, "Status Updated: Streetlight out"))
        .await
        .unwrap();

    let received = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("push should arrive promptly")
        .expect("stream should stay open");
    assert_eq!(received.id, delivered.id);
    assert_eq!(received.title, delivered.title);
}
