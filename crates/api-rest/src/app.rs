//! Application builder.
//!
//! Assembles routes, middleware, and shared state into an Axum router.
//! Tracing and state construction belong to the caller so tests can build
//! an app around a seeded in-memory state.

use crate::{
    middleware::{logging_middleware, request_id_middleware},
    routes,
    state::AppState,
};
use axum::{http::HeaderValue, middleware, Router};
use civicwatch_common::config::AppConfig;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = build_cors_layer(state.config());
    let timeout = TimeoutLayer::new(state.config().request_timeout());
    let enable_swagger = state.config().server.enable_swagger;

    let mut app = Router::new()
        // Health check routes (no auth required)
        .merge(routes::health_routes())
        // API v1 routes
        .nest("/api/v1", routes::v1_routes())
        .with_state(state);

    if enable_swagger {
        app = app.merge(swagger_ui());
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(cors)
            .layer(timeout)
            .layer(middleware::from_fn(request_id_middleware))
            .layer(middleware::from_fn(logging_middleware)),
    )
}

/// Build CORS layer from configuration
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.server.cors_allowed_origins;

    if origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Create the Swagger UI routes
fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// OpenAPI document for the REST surface
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CivicWatch API",
        description = "REST API for reporting and tracking civic infrastructure issues",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "This server")
    ),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "issues", description = "Issue reporting and lifecycle"),
        (name = "feeds", description = "Issue feeds and queues"),
        (name = "notifications", description = "Per-user notifications"),
    ),
    paths(
        crate::routes::health::health,
        crate::routes::health::ready,
        crate::routes::v1::issues::report_issue,
        crate::routes::v1::issues::get_issue,
        crate::routes::v1::issues::add_comment,
        crate::routes::v1::issues::upvote_issue,
        crate::routes::v1::issues::change_status,
        crate::routes::v1::issues::assign_issue,
        crate::routes::v1::feeds::nearby_issues,
        crate::routes::v1::feeds::my_reports,
        crate::routes::v1::feeds::authority_queue,
        crate::routes::v1::feeds::admin_board,
        crate::routes::v1::notifications::list_notifications,
        crate::routes::v1::notifications::unread_count,
        crate::routes::v1::notifications::mark_read,
        crate::routes::v1::notifications::mark_all_read,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::routes::health::HealthResponse,
        crate::routes::health::ReadinessResponse,
        crate::routes::health::DatabaseReadiness,
        crate::routes::v1::issues::LocationResponse,
        crate::routes::v1::issues::CommentResponse,
        crate::routes::v1::issues::StatusChangeResponse,
        crate::routes::v1::issues::IssueResponse,
        crate::routes::v1::feeds::IssueSummaryResponse,
        crate::routes::v1::feeds::NearbyIssueResponse,
        crate::routes::v1::notifications::NotificationResponse,
        crate::routes::v1::notifications::UnreadCountResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
