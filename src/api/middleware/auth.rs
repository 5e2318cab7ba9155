//! Bearer token authentication middleware.
//!
//! Verifies `Authorization: Bearer <token>` with the identity provider,
//! makes sure the identity has a profile (first login creates it), and
//! injects `CallerContext` for downstream handlers. The caller's role is
//! read from the stored profile, never from the request.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::middleware::bearer_token;
use crate::api::types::{ApiContext, CallerContext};
use crate::session::IdentityError;

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let bearer = bearer_token(&req)
        .ok_or(IdentityError::MissingToken)?
        .to_string();

    let identity = ctx.core.identity().verify(&bearer).map_err(|err| {
        tracing::debug!(error = %err, "Bearer token rejected");
        err
    })?;
    let caller = ctx.core.resolve_caller(&identity)?;

    req.extensions_mut().insert(CallerContext {
        caller,
        identity,
        bearer,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
