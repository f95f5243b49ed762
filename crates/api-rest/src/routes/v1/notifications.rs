//! Notification read API and the live push stream.
//!
//! Every endpoint is scoped to the authenticated caller; there is no way to
//! read or acknowledge another user's notifications. The stream endpoint
//! exposes the recipient channel over SSE, delivering pushes for
//! notifications created after the subscription.

use crate::{
    error::ApiResult,
    extractors::AuthenticatedUser,
    responses::{ApiResponse, NoContent},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use civicwatch_domain::{Notification, NotificationId};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Notification response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    /// In-app path to the subject issue
    pub link: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.into_uuid(),
            title: notification.title,
            message: notification.message,
            link: notification.link,
            is_read: notification.is_read,
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

/// Unread notification count
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    /// Number of unread notifications for the caller
    pub count: u64,
}

/// Notification routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/stream", get(stream_notifications))
        .route("/notifications/:id/read", post(mark_read))
}

/// The caller's recent notifications
///
/// Newest first, capped at the server retrieval limit.
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Recent notifications, newest first", body = Vec<NotificationResponse>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn list_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<Vec<NotificationResponse>>>> {
    let notifications = state.notifications().recent(&user.actor()).await?;
    let responses: Vec<NotificationResponse> =
        notifications.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(responses)))
}

/// Unread count
///
/// Cheap badge count for the caller.
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "notifications",
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn unread_count(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = state.notifications().unread_count(&user.actor()).await?;
    Ok(Json(ApiResponse::success(UnreadCountResponse { count })))
}

/// Mark one notification read
///
/// Idempotent; acknowledging an already-read notification succeeds.
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification marked read"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such notification for this caller"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<NoContent> {
    state
        .notifications()
        .mark_read(&user.actor(), NotificationId::from(id))
        .await?;
    Ok(NoContent)
}

/// Mark every notification read
#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 200, description = "All notifications marked read"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<()>>> {
    state.notifications().mark_all_read(&user.actor()).await?;
    Ok(Json(ApiResponse::message("All notifications marked read")))
}

/// Live notification stream
///
/// Server-sent events delivering the caller's pushes as they happen. Only
/// notifications created after the subscription arrive here; missed ones are
/// in the durable list.
pub(crate) async fn stream_notifications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let stream = state.notifications().subscribe(&user.actor()).await?;

    let events = stream.map(|notification| {
        let event = Event::default()
            .event("notification")
            .json_data(NotificationResponse::from(notification))
            .unwrap_or_else(|error| {
                tracing::warn!(error = %error, "Failed to encode notification event");
                Event::default().event("notification")
            });
        Ok::<_, Infallible>(event)
    });

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
