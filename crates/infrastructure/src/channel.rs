//! Live notification transports.
//!
//! Two [`RecipientChannel`] implementations: an in-process broadcast map
//! for single-node deployments and tests, and Redis pub/sub for fleets
//! where the publishing node and the subscriber's node differ. Both are
//! best-effort by contract; the durable store is the source of truth.

use async_trait::async_trait;
use civicwatch_application::{NotificationStream, RecipientChannel};
use civicwatch_common::RedisSettings;
use civicwatch_domain::{CoreError, CoreResult, Notification, StoreError, UserId};
use futures::StreamExt;
use parking_lot::RwLock;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Buffered notifications per recipient topic before slow subscribers lag.
const CHANNEL_CAPACITY: usize = 64;

/// Broadcast channel per recipient, all within one process.
#[derive(Default)]
pub struct InProcessRecipientChannel {
    topics: RwLock<HashMap<UserId, tokio::sync::broadcast::Sender<Notification>>>,
}

impl InProcessRecipientChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipientChannel for InProcessRecipientChannel {
    async fn publish(&self, recipient_id: UserId, notification: &Notification) -> CoreResult<()> {
        let topics = self.topics.read();
        if let Some(sender) = topics.get(&recipient_id) {
            // Err here means every subscriber hung up; the push is dropped
            // by contract.
            let _ = sender.send(notification.clone());
        }
        Ok(())
    }

    async fn subscribe(&self, recipient_id: UserId) -> CoreResult<NotificationStream> {
        let receiver = {
            let mut topics = self.topics.write();
            topics
                .entry(recipient_id)
                .or_insert_with(|| tokio::sync::broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe()
        };

        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(notification) => return Some((notification, receiver)),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Subscriber lagged; missed pushes stay durable");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

/// Redis pub/sub transport, one channel per recipient.
pub struct RedisRecipientChannel {
    client: redis::Client,
    connection: ConnectionManager,
    channel_prefix: String,
}

impl RedisRecipientChannel {
    /// Connect to Redis with the configured channel prefix.
    pub async fn new(settings: &RedisSettings) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = redis::Client::open(settings.url.as_str()).context("Invalid Redis URL")?;
        let connection = ConnectionManager::new(client.clone())
            .await
            .context("Failed to connect to Redis")?;

        info!("Connected to Redis for live notification delivery");
        Ok(Self {
            client,
            connection,
            channel_prefix: settings.channel_prefix.clone(),
        })
    }

    fn channel_name(&self, recipient_id: UserId) -> String {
        format!("{}:user:{}", self.channel_prefix, recipient_id)
    }
}

#[async_trait]
impl RecipientChannel for RedisRecipientChannel {
    async fn publish(&self, recipient_id: UserId, notification: &Notification) -> CoreResult<()> {
        let payload = serde_json::to_string(notification)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut connection = self.connection.clone();
        let receivers: i64 = connection
            .publish(self.channel_name(recipient_id), payload)
            .await
            .map_err(channel_error)?;

        debug!(receivers, %recipient_id, "Published live notification");
        Ok(())
    }

    async fn subscribe(&self, recipient_id: UserId) -> CoreResult<NotificationStream> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(channel_error)?
            .into_pubsub();
        pubsub
            .subscribe(self.channel_name(recipient_id))
            .await
            .map_err(channel_error)?;

        let stream = pubsub.into_on_message().filter_map(|message| async move {
            let payload: String = message.get_payload().ok()?;
            match serde_json::from_str::<Notification>(&payload) {
                Ok(notification) => Some(notification),
                Err(e) => {
                    warn!(error = %e, "Discarding undecodable live notification");
                    None
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

fn channel_error(err: redis::RedisError) -> CoreError {
    StoreError::Unavailable(format!("redis: {err}")).into()
}
