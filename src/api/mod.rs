//! HTTP API.
//!
//! Exposes profiles, vitals and advisory actions as JSON endpoints under
//! `/api/`, behind a middleware stack: Rate Limit → Auth → Audit → Handler.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::{api_router, api_router_with_ctx};
pub use server::{start_api_server, ApiServer, ApiServerSession, ServerError};
pub use types::{ApiContext, CallerContext, RateLimiter};
