//! Per-client rate limiting middleware.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::middleware::bearer_token;
use crate::api::types::ApiContext;
use crate::session::IdentityProvider;

const ANONYMOUS_KEY: &str = "anonymous";

/// Rate-limit key: the verified identity id. Missing or unknown tokens all
/// share one bucket, so made-up tokens never get a fresh allowance.
fn rate_key(identities: &dyn IdentityProvider, req: &Request<axum::body::Body>) -> String {
    bearer_token(req)
        .and_then(|token| identities.verify(token).ok())
        .map(|identity| format!("user:{}", identity.id))
        .unwrap_or_else(|| ANONYMOUS_KEY.to_string())
}

/// Returns 429 with `Retry-After` once a client exceeds its window.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    match limit_inner(req, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn limit_inner(req: Request<axum::body::Body>, next: Next) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let key = rate_key(ctx.core.identity(), &req);

    // MutexGuard is !Send, drop it before .await
    {
        let mut limiter = ctx
            .rate_limiter
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock".into()))?;

        limiter.check(&key).map_err(|retry_after| {
            tracing::warn!(key = %key, retry_after, "Rate limit exceeded");
            ApiError::RateLimited { retry_after }
        })?;
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Identity, TokenIdentityProvider};

    fn request(auth: Option<&str>) -> Request<axum::body::Body> {
        let mut builder = Request::builder().uri("/api/profile/me");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[test]
    fn rate_key_uses_verified_identity() {
        let identities = TokenIdentityProvider::new();
        identities.register(Identity::new("u1")).unwrap();
        let token = identities.issue_token("u1").unwrap();
        let key = rate_key(&identities, &request(Some(&format!("Bearer {token}"))));
        assert_eq!(key, "user:u1");
    }

    #[test]
    fn rate_key_falls_back_to_anonymous() {
        let identities = TokenIdentityProvider::new();
        assert_eq!(rate_key(&identities, &request(None)), "anonymous");
        assert_eq!(rate_key(&identities, &request(Some("Basic xyz"))), "anonymous");
        assert_eq!(
            rate_key(&identities, &request(Some("Bearer made-up-token"))),
            "anonymous"
        );
    }
}
