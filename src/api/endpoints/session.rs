//! Sign-in and sign-out.
//!
//! Sign-in is idempotent: the auth middleware has already ensured the
//! profile exists, this records the session and tells the client which
//! dashboard to open for the stored role.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::Profile;
use crate::session::{ActiveSession, AuthEvent, DashboardView, SessionState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub profile: Profile,
    pub dashboard: DashboardView,
    pub redirect: &'static str,
    pub session: Option<ActiveSession>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutResponse {
    pub signed_out: bool,
    pub token_revoked: bool,
}

/// `POST /api/session/sign-in`
pub async fn sign_in(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<SignInResponse>, ApiError> {
    let sessions = ctx.core.sessions();
    let profile = match sessions.handle(AuthEvent::SignedIn(caller.identity.clone()))? {
        SessionState::Active(profile) => profile,
        SessionState::SignedOut => {
            return Err(ApiError::Internal("sign-in produced no session".into()))
        }
    };

    let dashboard = DashboardView::for_role(profile.role);
    Ok(Json(SignInResponse {
        redirect: dashboard.route(),
        dashboard,
        session: sessions.session(&caller.identity.id),
        profile,
    }))
}

/// `POST /api/session/sign-out`, ends the session and revokes the token.
pub async fn sign_out(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<SignOutResponse>, ApiError> {
    let state = ctx.core.sessions().handle(AuthEvent::SignedOut {
        id: caller.identity.id.clone(),
    })?;
    let token_revoked = ctx.core.identity().revoke(&caller.bearer);

    Ok(Json(SignOutResponse {
        signed_out: state == SessionState::SignedOut,
        token_revoked,
    }))
}
