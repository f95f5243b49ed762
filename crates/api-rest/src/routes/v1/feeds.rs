//! Read-side feeds: proximity search, personal history, the authority work
//! queue, and the admin oversight board.
//!
//! The proximity feed is public; the remaining feeds are scoped to the
//! caller by the core's authorization rules (an authority sees only its own
//! queue, the board is admin-only).

use crate::{
    error::ApiResult,
    extractors::{AuthenticatedUser, Pagination},
    responses::PaginatedResponse,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use civicwatch_application::{
    AdminListQuery, IssueSummary, NearbyIssueSummary, NearbyQuery, QueueQuery,
};
use civicwatch_domain::{IssueCategory, IssuePriority, IssueStatus, SeverityTier, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::issues::LocationResponse;

/// Compact issue projection for feed rows
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueSummaryResponse {
    pub id: Uuid,
    pub title: String,
    #[schema(value_type = String)]
    pub category: IssueCategory,
    #[schema(value_type = String)]
    pub status: IssueStatus,
    #[schema(value_type = String)]
    pub priority: IssuePriority,
    /// Escalation tier computed at read time
    #[schema(value_type = String)]
    pub severity: SeverityTier,
    pub location: LocationResponse,
    pub upvotes: u32,
    pub comment_count: usize,
    pub created_at: String,
}

impl From<IssueSummary> for IssueSummaryResponse {
    fn from(summary: IssueSummary) -> Self {
        Self {
            id: summary.id.into_uuid(),
            title: summary.title,
            category: summary.category,
            status: summary.status,
            priority: summary.priority,
            severity: summary.severity,
            location: summary.location.into(),
            upvotes: summary.upvotes,
            comment_count: summary.comment_count,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

/// Proximity feed row: summary plus distance from the query origin
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NearbyIssueResponse {
    #[serde(flatten)]
    pub summary: IssueSummaryResponse,

    /// Great-circle distance from the query origin in meters
    pub distance_meters: f64,
}

impl From<NearbyIssueSummary> for NearbyIssueResponse {
    fn from(near: NearbyIssueSummary) -> Self {
        Self {
            summary: near.summary.into(),
            distance_meters: near.distance_meters,
        }
    }
}

/// Feed routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/issues/nearby", get(nearby_issues))
        .route("/issues/mine", get(my_reports))
        .route("/issues/assigned/:authority_id", get(authority_queue))
        .route("/admin/issues", get(admin_board))
}

/// Issues near a point
///
/// Public proximity feed ordered nearest-first. The radius defaults to 2 km
/// and is capped at 50 km.
#[utoipa::path(
    get,
    path = "/issues/nearby",
    tag = "feeds",
    params(
        ("lat" = f64, Query, description = "Origin latitude"),
        ("lng" = f64, Query, description = "Origin longitude"),
        ("radius" = Option<f64>, Query, description = "Search radius in meters (default 2000, max 50000)"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<u32>, Query, description = "Page number (1-indexed)"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Issues within the radius, nearest first", body = PaginatedResponse<NearbyIssueResponse>),
        (status = 422, description = "Origin or radius out of range"),
    )
)]
pub(crate) async fn nearby_issues(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
    pagination: Pagination,
) -> ApiResult<Json<PaginatedResponse<NearbyIssueResponse>>> {
    let page = state.feed().nearby(&query, pagination.request).await?;
    Ok(Json(page.map(NearbyIssueResponse::from).into()))
}

/// The caller's reported issues
///
/// Newest first, regardless of status.
#[utoipa::path(
    get,
    path = "/issues/mine",
    tag = "feeds",
    params(
        ("page" = Option<u32>, Query, description = "Page number (1-indexed)"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "The caller's reports, newest first", body = PaginatedResponse<IssueSummaryResponse>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn my_reports(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    pagination: Pagination,
) -> ApiResult<Json<PaginatedResponse<IssueSummaryResponse>>> {
    let page = state
        .feed()
        .my_reports(&user.actor(), pagination.request)
        .await?;
    Ok(Json(page.map(IssueSummaryResponse::from).into()))
}

/// An authority's work queue
///
/// Issues currently assigned to the authority, open to that authority and to
/// admins.
#[utoipa::path(
    get,
    path = "/issues/assigned/{authority_id}",
    tag = "feeds",
    params(
        ("authority_id" = Uuid, Path, description = "Authority whose queue to list"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("priority" = Option<String>, Query, description = "Filter by priority"),
        ("page" = Option<u32>, Query, description = "Page number (1-indexed)"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "The authority's assigned issues", body = PaginatedResponse<IssueSummaryResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller may not view this queue"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn authority_queue(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(authority_id): Path<Uuid>,
    Query(query): Query<QueueQuery>,
    pagination: Pagination,
) -> ApiResult<Json<PaginatedResponse<IssueSummaryResponse>>> {
    let page = state
        .feed()
        .authority_queue(
            &user.actor(),
            UserId::from(authority_id),
            &query,
            pagination.request,
        )
        .await?;
    Ok(Json(page.map(IssueSummaryResponse::from).into()))
}

/// The admin oversight board
///
/// Every issue in the system with filtering, text search, and a reporting
/// date window. Admin-only.
#[utoipa::path(
    get,
    path = "/admin/issues",
    tag = "feeds",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("priority" = Option<String>, Query, description = "Filter by priority"),
        ("search" = Option<String>, Query, description = "Case-insensitive title/description search"),
        ("from" = Option<String>, Query, description = "Reported-at window start (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Reported-at window end (RFC 3339)"),
        ("page" = Option<u32>, Query, description = "Page number (1-indexed)"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "All issues matching the filters", body = PaginatedResponse<IssueSummaryResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 422, description = "Inverted date window"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn admin_board(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<AdminListQuery>,
    pagination: Pagination,
) -> ApiResult<Json<PaginatedResponse<IssueSummaryResponse>>> {
    let page = state
        .feed()
        .admin_board(&user.actor(), &query, pagination.request)
        .await?;
    Ok(Json(page.map(IssueSummaryResponse::from).into()))
}
