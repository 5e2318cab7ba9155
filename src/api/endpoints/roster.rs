//! Role dashboards: a doctor's assigned patients, the admin user list and
//! the access log.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::authorization::{authorize, Action};
use crate::core_state::AuditEntry;
use crate::models::Profile;

#[derive(Debug, Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<Profile>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<Profile>,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub entries: Vec<AuditEntry>,
}

/// `GET /api/doctor/patients`, patients assigned to the calling doctor.
pub async fn my_patients(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let patients = ctx
        .core
        .directory()
        .list_profiles_by_doctor(&caller.caller, &caller.caller.id)?;
    Ok(Json(PatientsResponse { patients }))
}

/// `GET /api/admin/users`
pub async fn all_users(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = ctx.core.directory().list_all_profiles(&caller.caller)?;
    Ok(Json(UsersResponse { users }))
}

/// `GET /api/admin/audit`, most recent API accesses, oldest first.
pub async fn audit_log(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<AuditResponse>, ApiError> {
    authorize(&caller.caller, Action::ViewAuditLog)?;
    Ok(Json(AuditResponse {
        entries: ctx.core.audit_entries(),
    }))
}
