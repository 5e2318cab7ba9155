//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter, rejects before any store work
//! 2. Auth, resolves the bearer token to a `CallerContext`
//! 3. Audit logger, runs after auth so the caller id is known

pub mod audit;
pub mod auth;
pub mod rate;

/// Bearer token from the `Authorization` header, if present.
pub(crate) fn bearer_token(req: &axum::http::Request<axum::body::Body>) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
