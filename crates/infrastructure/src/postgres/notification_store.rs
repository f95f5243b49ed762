//! Durable notification records.

use async_trait::async_trait;
use civicwatch_application::NotificationStore;
use civicwatch_domain::{
    CoreError, CoreResult, Notification, NotificationError, NotificationId, UserId,
};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::db_error;
use crate::database::DatabasePool;

/// PostgreSQL implementation of [`NotificationStore`].
pub struct PgNotificationStore {
    pool: PgPool,
    statement_timeout_ms: u64,
}

impl PgNotificationStore {
    pub fn new(db: &DatabasePool) -> Self {
        Self {
            pool: db.pool().clone(),
            statement_timeout_ms: db.statement_timeout_ms(),
        }
    }

    fn err(&self, operation: &'static str) -> impl Fn(sqlx::Error) -> CoreError + '_ {
        move |e| db_error(operation, self.statement_timeout_ms, e)
    }
}

fn row_to_notification(row: sqlx::postgres::PgRow) -> Notification {
    Notification {
        id: NotificationId::from(row.get::<Uuid, _>("id")),
        recipient_id: UserId::from(row.get::<Uuid, _>("recipient_id")),
        title: row.get("title"),
        message: row.get("message"),
        link: row.get("link"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    #[instrument(skip(self, notification), fields(recipient_id = %notification.recipient_id))]
    async fn append(&self, notification: &Notification) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, title, message, link, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.recipient_id.as_uuid())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.link)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(self.err("notifications.append"))?;

        debug!(notification_id = %notification.id, "Notification recorded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_for(&self, recipient_id: UserId, limit: u32) -> CoreResult<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, recipient_id, title, message, link, is_read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(recipient_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(self.err("notifications.recent_for"))?;

        Ok(rows.into_iter().map(row_to_notification).collect())
    }

    #[instrument(skip(self))]
    async fn unread_count(&self, recipient_id: UserId) -> CoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(self.err("notifications.unread_count"))?;

        Ok(count as u64)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, recipient_id: UserId, id: NotificationId) -> CoreResult<()> {
        // No is_read predicate: re-marking a read notification matches the
        // row and stays a success.
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id.as_uuid())
        .bind(recipient_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(self.err("notifications.mark_read"))?;

        if result.rows_affected() == 0 {
            return Err(NotificationError::NotFound(id).into());
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, recipient_id: UserId) -> CoreResult<()> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read")
                .bind(recipient_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(self.err("notifications.mark_all_read"))?;

        debug!(
            recipient_id = %recipient_id,
            marked = result.rows_affected(),
            "Marked all notifications read"
        );
        Ok(())
    }
}
