//! Audit logging middleware.
//!
//! Records caller id, method, path and response status for every
//! authenticated request. Runs innermost, after auth has injected
//! `CallerContext`.

use axum::extract::OriginalUri;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::{ApiContext, CallerContext};

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    // Nested routers see the path with `/api` stripped
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let caller_id = req
        .extensions()
        .get::<CallerContext>()
        .map(|c| c.caller.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(req).await;
    let status = response.status().as_u16();

    tracing::info!(caller_id = %caller_id, %method, %path, status, "API access");
    if let Some(ctx) = ctx {
        ctx.core
            .log_access(&caller_id, &format!("{method} {path}"), entity_of(&path), status);
    }

    response
}

/// First path segment after `/api`, e.g. `profiles` for `/api/profiles/u1`.
fn entity_of(path: &str) -> &str {
    path.trim_start_matches('/')
        .trim_start_matches("api/")
        .split('/')
        .next()
        .unwrap_or("")
}
