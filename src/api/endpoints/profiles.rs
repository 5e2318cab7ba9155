//! Profile read and update endpoints.
//!
//! Access checks live in `ProfileDirectory`; handlers only translate
//! request bodies into `ProfileUpdate`s.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Deserializer};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::{NotificationPreferences, Profile, ProfileUpdate, Role};
use crate::profiles::DataError;

/// Body of `PATCH /api/profile/me` and `PATCH /api/profiles/:id`.
///
/// `doctorId: null` clears the assignment; an absent key leaves it alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub notification_preferences: Option<NotificationPreferences>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub doctor_id: Option<Option<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ProfilePatch {
    pub fn into_update(self) -> Result<ProfileUpdate, DataError> {
        let role = self.role.as_deref().map(parse_role).transpose()?;
        Ok(ProfileUpdate {
            name: self.name,
            avatar_url: self.avatar_url,
            notification_preferences: self.notification_preferences,
            role,
            doctor_id: self.doctor_id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDoctorRequest {
    pub doctor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

fn parse_role(raw: &str) -> Result<Role, DataError> {
    Ok(raw.trim().parse::<Role>()?)
}

/// `GET /api/profile/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<Profile>, ApiError> {
    let profile = ctx
        .core
        .directory()
        .get_profile(&caller.caller, &caller.caller.id)?;
    Ok(Json(profile))
}

/// `PATCH /api/profile/me`
pub async fn update_me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, ApiError> {
    let profile = ctx.core.directory().update_profile(
        &caller.caller,
        &caller.caller.id,
        patch.into_update()?,
    )?;
    Ok(Json(profile))
}

/// `GET /api/profiles/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(ctx.core.directory().get_profile(&caller.caller, &id)?))
}

/// `PATCH /api/profiles/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, ApiError> {
    let profile = ctx
        .core
        .directory()
        .update_profile(&caller.caller, &id, patch.into_update()?)?;
    Ok(Json(profile))
}

/// `PUT /api/profiles/:id/doctor`, `{"doctorId": null}` unassigns.
pub async fn assign_doctor(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(req): Json<AssignDoctorRequest>,
) -> Result<Json<Profile>, ApiError> {
    let profile =
        ctx.core
            .directory()
            .assign_doctor(&caller.caller, &id, req.doctor_id.as_deref())?;
    Ok(Json(profile))
}

/// `PUT /api/profiles/:id/role`
pub async fn set_role(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<Profile>, ApiError> {
    let role = parse_role(&req.role)?;
    Ok(Json(ctx.core.directory().set_role(&caller.caller, &id, role)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_null_from_absent_doctor() {
        let absent: ProfilePatch = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(absent.doctor_id, None);

        let cleared: ProfilePatch = serde_json::from_str(r#"{"doctorId":null}"#).unwrap();
        assert_eq!(cleared.doctor_id, Some(None));

        let set: ProfilePatch = serde_json::from_str(r#"{"doctorId":"d1"}"#).unwrap();
        assert_eq!(set.doctor_id, Some(Some("d1".to_string())));
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        assert!(serde_json::from_str::<ProfilePatch>(r#"{"vitals":[]}"#).is_err());
    }

    #[test]
    fn patch_with_unknown_role_is_a_validation_error() {
        let patch = ProfilePatch {
            role: Some("superuser".into()),
            ..Default::default()
        };
        assert!(matches!(patch.into_update(), Err(DataError::Validation(_))));
    }

    #[test]
    fn patch_parses_role() {
        let patch = ProfilePatch {
            role: Some(" doctor ".into()),
            ..Default::default()
        };
        assert_eq!(patch.into_update().unwrap().role, Some(Role::Doctor));
    }
}
