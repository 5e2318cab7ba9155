use serde::{Deserialize, Serialize};

use super::device::Device;
use super::enums::Role;
use super::vital::Vital;

/// Display name given to profiles whose identity carries none.
pub const DEFAULT_PROFILE_NAME: &str = "New User";

/// Avatar used when the identity provider supplies no photo.
pub const PLACEHOLDER_AVATAR_URL: &str = "https://placehold.co/100x100.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub high_priority_alerts: bool,
    pub new_recommendations: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            high_priority_alerts: true,
            new_recommendations: false,
        }
    }
}

/// A fully normalized user profile. Every optional document field has
/// already been filled with its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub role: Role,
    /// Assigned doctor. Only ever set on patient profiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    pub devices: Vec<Device>,
    /// Ascending by `time`.
    pub vitals: Vec<Vital>,
    pub notification_preferences: NotificationPreferences,
}

impl Profile {
    /// A fresh patient profile with empty history and default preferences.
    pub fn new_patient(id: &str, name: &str, email: &str, avatar_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            avatar_url: avatar_url.to_string(),
            role: Role::Patient,
            doctor_id: None,
            devices: Vec::new(),
            vitals: Vec::new(),
            notification_preferences: NotificationPreferences::default(),
        }
    }

    pub fn latest_vital(&self) -> Option<&Vital> {
        self.vitals.last()
    }
}

/// Partial profile update. Only `Some` fields are written; everything else
/// in the stored document is left untouched.
///
/// `doctor_id: Some(None)` removes the assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<NotificationPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.avatar_url.is_none()
            && self.notification_preferences.is_none()
            && self.role.is_none()
            && self.doctor_id.is_none()
    }

    /// Whether the update touches fields only administrators may change.
    pub fn touches_admin_fields(&self) -> bool {
        self.role.is_some() || self.doctor_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_notification_preferences() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.high_priority_alerts);
        assert!(!prefs.new_recommendations);
    }

    #[test]
    fn new_patient_has_defaults() {
        let p = Profile::new_patient("u1", "Ada", "ada@example.com", PLACEHOLDER_AVATAR_URL);
        assert_eq!(p.role, Role::Patient);
        assert!(p.doctor_id.is_none());
        assert!(p.vitals.is_empty());
        assert!(p.devices.is_empty());
        assert!(p.latest_vital().is_none());
    }

    #[test]
    fn profile_serializes_camel_case() {
        let p = Profile::new_patient("u1", "Ada", "", PLACEHOLDER_AVATAR_URL);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["avatarUrl"], PLACEHOLDER_AVATAR_URL);
        assert_eq!(json["role"], "patient");
        assert_eq!(json["notificationPreferences"]["highPriorityAlerts"], true);
        assert!(json.get("doctorId").is_none());
    }

    #[test]
    fn update_serializes_only_given_fields() {
        let update = ProfileUpdate {
            name: Some("X".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "X" }));
    }

    #[test]
    fn clearing_doctor_serializes_as_null() {
        let update = ProfileUpdate {
            doctor_id: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "doctorId": null }));
        assert!(update.touches_admin_fields());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(ProfileUpdate::default().is_empty());
        assert!(!ProfileUpdate::default().touches_admin_fields());
    }
}
