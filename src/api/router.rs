//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Rate limiter → 2. Auth → 3. Audit logger

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with a fresh rate limiter.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

/// Build the router from a pre-constructed `ApiContext`.
pub fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers apply bottom (innermost) to top (outermost):
    //   Extension → Rate limit → Auth → Audit → Handler
    //
    // Extension must be outermost so all middleware can access ApiContext.
    // `.with_state()` turns Router<ApiContext> into Router<()> so the
    // from_fn layers (state = ()) fit.
    let protected = Router::new()
        .route("/session/sign-in", post(endpoints::session::sign_in))
        .route("/session/sign-out", post(endpoints::session::sign_out))
        .route(
            "/profile/me",
            get(endpoints::profiles::me).patch(endpoints::profiles::update_me),
        )
        .route(
            "/profiles/:id",
            get(endpoints::profiles::detail).patch(endpoints::profiles::update),
        )
        .route("/profiles/:id/doctor", put(endpoints::profiles::assign_doctor))
        .route("/profiles/:id/role", put(endpoints::profiles::set_role))
        .route(
            "/profiles/:id/vitals",
            get(endpoints::vitals::list).post(endpoints::vitals::record),
        )
        .route(
            "/profiles/:id/triage-latest",
            post(endpoints::advisory::triage_latest),
        )
        .route(
            "/profiles/:id/timeline-summary",
            post(endpoints::advisory::profile_timeline_summary),
        )
        .route("/doctor/patients", get(endpoints::roster::my_patients))
        .route("/admin/users", get(endpoints::roster::all_users))
        .route("/admin/audit", get(endpoints::roster::audit_log))
        .route("/advisory/triage", post(endpoints::advisory::triage))
        .route(
            "/advisory/recommendation",
            post(endpoints::advisory::recommendation),
        )
        .route(
            "/advisory/timeline-summary",
            post(endpoints::advisory::timeline_summary),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    // Rate-limited only, no auth
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors)
}
