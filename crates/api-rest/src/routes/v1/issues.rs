//! Issue lifecycle endpoints: reporting, engagement, and workflow.
//!
//! Authorization is enforced by the core services from the caller's
//! [`ActorContext`]; handlers only translate between HTTP and the core. The
//! issue detail read is public so shared links work without an account.

use crate::{
    error::ApiResult,
    extractors::{AuthenticatedUser, ValidatedJson},
    responses::{ApiResponse, Created},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use civicwatch_application::{
    AddCommentRequest, AssignIssueRequest, ChangeStatusRequest, ReportIssueRequest,
};
use civicwatch_domain::{
    Comment, GeoLocation, Issue, IssueCategory, IssueId, IssuePriority, IssueStatus, SeverityTier,
    StatusChange,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Geographic location response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
}

impl From<GeoLocation> for LocationResponse {
    fn from(location: GeoLocation) -> Self {
        Self {
            longitude: location.point.longitude(),
            latitude: location.point.latitude(),
            address: location.address,
        }
    }
}

/// Comment response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub author: Uuid,
    pub text: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.into_uuid(),
            author: comment.author.into_uuid(),
            text: comment.text,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// One entry of the issue's audit trail
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeResponse {
    #[schema(value_type = String)]
    pub status: IssueStatus,
    pub changed_by: Uuid,
    pub changed_at: String,
}

impl From<StatusChange> for StatusChangeResponse {
    fn from(change: StatusChange) -> Self {
        Self {
            status: change.status,
            changed_by: change.changed_by.into_uuid(),
            changed_at: change.changed_at.to_rfc3339(),
        }
    }
}

/// Issue detail response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
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
    pub images: Vec<String>,
    pub reported_by: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    pub upvotes: u32,
    pub comments: Vec<CommentResponse>,
    pub status_history: Vec<StatusChangeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
    pub resolution_images: Vec<String>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Issue> for IssueResponse {
    fn from(issue: Issue) -> Self {
        let severity = issue.severity_at(Utc::now());
        Self {
            id: issue.id.into_uuid(),
            title: issue.title,
            description: issue.description,
            category: issue.category,
            status: issue.status,
            priority: issue.priority,
            severity,
            location: issue.location.into(),
            images: issue.images.iter().map(|url| url.to_string()).collect(),
            reported_by: issue.reported_by.into_uuid(),
            assigned_to: issue.assigned_to.map(|id| id.into_uuid()),
            upvotes: issue.upvotes,
            comments: issue.comments.into_iter().map(Into::into).collect(),
            status_history: issue
                .status_history
                .into_iter()
                .map(Into::into)
                .collect(),
            resolution_notes: issue.resolution_notes,
            resolution_images: issue
                .resolution_images
                .iter()
                .map(|url| url.to_string())
                .collect(),
            version: issue.version,
            created_at: issue.created_at.to_rfc3339(),
            updated_at: issue.updated_at.to_rfc3339(),
        }
    }
}

/// Issue lifecycle routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/issues", post(report_issue))
        .route("/issues/:id", get(get_issue))
        .route("/issues/:id/comments", post(add_comment))
        .route("/issues/:id/upvote", post(upvote_issue))
        .route("/issues/:id/status", patch(change_status))
        .route("/issues/:id/assign", patch(assign_issue))
}

/// Report a new issue
///
/// Any authenticated user may report. The issue starts in `reported` status
/// with the caller recorded as reporter.
#[utoipa::path(
    post,
    path = "/issues",
    tag = "issues",
    responses(
        (status = 201, description = "Issue reported", body = IssueResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid fields or coordinates"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn report_issue(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ReportIssueRequest>,
) -> ApiResult<Created<IssueResponse>> {
    let issue = state.issues().report(&user.actor(), request).await?;
    Ok(Created(issue.into()))
}

/// Get issue detail
///
/// Public read returning the full entity including comments and the audit
/// trail.
#[utoipa::path(
    get,
    path = "/issues/{id}",
    tag = "issues",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Issue detail", body = IssueResponse),
        (status = 404, description = "No such issue"),
    )
)]
pub(crate) async fn get_issue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<IssueResponse>>> {
    let issue = state.issues().get(IssueId::from(id)).await?;
    Ok(Json(ApiResponse::success(issue.into())))
}

/// Comment on an issue
///
/// Comments stay open in every status, including after resolution.
#[utoipa::path(
    post,
    path = "/issues/{id}/comments",
    tag = "issues",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Comment appended", body = IssueResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such issue"),
        (status = 422, description = "Empty or oversized comment"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddCommentRequest>,
) -> ApiResult<Json<ApiResponse<IssueResponse>>> {
    let issue = state
        .issues()
        .comment(&user.actor(), IssueId::from(id), request)
        .await?;
    Ok(Json(ApiResponse::success(issue.into())))
}

/// Upvote an issue
///
/// Each call increments the public support count; upvotes stay open in every
/// status.
#[utoipa::path(
    post,
    path = "/issues/{id}/upvote",
    tag = "issues",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Upvote recorded", body = IssueResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such issue"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn upvote_issue(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<IssueResponse>>> {
    let issue = state
        .issues()
        .upvote(&user.actor(), IssueId::from(id))
        .await?;
    Ok(Json(ApiResponse::success(issue.into())))
}

/// Change issue status
///
/// Walks the fixed workflow; only the assigned authority or an admin may
/// transition, and resolved issues reject further transitions.
#[utoipa::path(
    patch,
    path = "/issues/{id}/status",
    tag = "issues",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Status changed", body = IssueResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller may not work this issue"),
        (status = 404, description = "No such issue"),
        (status = 409, description = "Transition not in the workflow"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn change_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ChangeStatusRequest>,
) -> ApiResult<Json<ApiResponse<IssueResponse>>> {
    let issue = state
        .issues()
        .change_status(&user.actor(), IssueId::from(id), request)
        .await?;
    Ok(Json(ApiResponse::success(issue.into())))
}

/// Assign an issue to an authority
///
/// Admin-only. Reassignment keeps the current progress; the displaced
/// authority is notified.
#[utoipa::path(
    patch,
    path = "/issues/{id}/assign",
    tag = "issues",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Issue assigned", body = IssueResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such issue or authority"),
        (status = 409, description = "Issue is resolved"),
        (status = 422, description = "Assignee is not an active authority"),
    ),
    security(("bearer_auth" = []))
)]
pub(crate) async fn assign_issue(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignIssueRequest>,
) -> ApiResult<Json<ApiResponse<IssueResponse>>> {
    let issue = state
        .assignments()
        .assign(&user.actor(), IssueId::from(id), request)
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        issue.into(),
        "Issue assigned",
    )))
}
