//! Raw profile document shape and the single normalization step applied to
//! every document read from the store.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Document, StoreError};
use crate::models::{
    Device, NotificationPreferences, Profile, Role, Vital, DEFAULT_PROFILE_NAME,
    PLACEHOLDER_AVATAR_URL,
};

/// A profile document exactly as stored: every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<Device>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitals: Option<Vec<Vital>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_preferences: Option<NotificationPreferences>,
}

impl StoredProfile {
    /// Parse a raw store document.
    ///
    /// Each field is read on its own. A field that does not parse is
    /// treated as missing, so one malformed substructure never hides the
    /// rest of the profile.
    pub fn from_document(id: &str, doc: Document) -> Result<Self, StoreError> {
        let Value::Object(mut fields) = doc else {
            return Err(StoreError::InvalidDocument { id: id.to_string() });
        };
        Ok(Self {
            name: take_field(id, &mut fields, "name"),
            email: take_field(id, &mut fields, "email"),
            avatar_url: take_field(id, &mut fields, "avatarUrl"),
            role: take_field(id, &mut fields, "role"),
            doctor_id: take_field(id, &mut fields, "doctorId"),
            devices: take_field(id, &mut fields, "devices"),
            vitals: take_field(id, &mut fields, "vitals"),
            notification_preferences: take_field(id, &mut fields, "notificationPreferences"),
        })
    }

    /// Full document for a profile. The id is the document key and is not
    /// repeated inside the document.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            email: Some(profile.email.clone()),
            avatar_url: Some(profile.avatar_url.clone()),
            role: Some(profile.role.as_str().to_string()),
            doctor_id: profile.doctor_id.clone(),
            devices: Some(profile.devices.clone()),
            vitals: Some(profile.vitals.clone()),
            notification_preferences: Some(profile.notification_preferences),
        }
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Fill every missing field with its default.
    ///
    /// Substructures are taken whole: either the stored value or the full
    /// default, never a mix. An unrecognized role falls back to `patient`.
    pub fn normalize(self, id: &str) -> Profile {
        let role = match self.role.as_deref() {
            None => Role::default(),
            Some(raw) => Role::from_str(raw).unwrap_or_else(|_| {
                tracing::warn!(profile_id = id, role = raw, "Unknown stored role, using patient");
                Role::default()
            }),
        };

        Profile {
            id: id.to_string(),
            name: self.name.unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
            email: self.email.unwrap_or_default(),
            avatar_url: self
                .avatar_url
                .unwrap_or_else(|| PLACEHOLDER_AVATAR_URL.to_string()),
            role,
            doctor_id: self.doctor_id.filter(|d| !d.is_empty()),
            devices: self.devices.unwrap_or_default(),
            vitals: self.vitals.unwrap_or_default(),
            notification_preferences: self.notification_preferences.unwrap_or_default(),
        }
    }
}

fn take_field<T: DeserializeOwned>(
    id: &str,
    fields: &mut Map<String, Value>,
    key: &str,
) -> Option<T> {
    let raw = fields.remove(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(profile_id = id, field = key, error = %e, "Malformed stored field, using default");
            None
        }
    }
}

/// Parse and normalize in one step.
pub fn profile_from_document(id: &str, doc: Document) -> Result<Profile, StoreError> {
    Ok(StoredProfile::from_document(id, doc)?.normalize(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_gets_every_default() {
        let profile = profile_from_document("u1", json!({})).unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.name, DEFAULT_PROFILE_NAME);
        assert_eq!(profile.email, "");
        assert_eq!(profile.avatar_url, PLACEHOLDER_AVATAR_URL);
        assert_eq!(profile.role, Role::Patient);
        assert!(profile.devices.is_empty());
        assert!(profile.vitals.is_empty());
        assert_eq!(
            profile.notification_preferences,
            NotificationPreferences::default()
        );
    }

    #[test]
    fn stored_preferences_are_kept_whole() {
        let doc = json!({
            "name": "Ada",
            "notificationPreferences": { "highPriorityAlerts": false, "newRecommendations": true }
        });
        let profile = profile_from_document("u1", doc).unwrap();
        assert!(!profile.notification_preferences.high_priority_alerts);
        assert!(profile.notification_preferences.new_recommendations);
    }

    #[test]
    fn null_fields_are_treated_as_missing() {
        let doc = json!({ "vitals": null, "devices": null, "notificationPreferences": null });
        let profile = profile_from_document("u1", doc).unwrap();
        assert!(profile.vitals.is_empty());
        assert!(profile.devices.is_empty());
        assert!(profile.notification_preferences.high_priority_alerts);
    }

    #[test]
    fn unknown_role_falls_back_to_patient() {
        let profile = profile_from_document("u1", json!({ "role": "root" })).unwrap();
        assert_eq!(profile.role, Role::Patient);
    }

    #[test]
    fn partial_substructure_gets_the_whole_default() {
        let doc = json!({
            "name": "Bob",
            "notificationPreferences": { "highPriorityAlerts": false }
        });
        let profile = profile_from_document("u1", doc).unwrap();
        assert_eq!(profile.name, "Bob");
        assert_eq!(
            profile.notification_preferences,
            NotificationPreferences::default()
        );
    }

    #[test]
    fn malformed_vitals_fall_back_without_losing_other_fields() {
        let doc = json!({
            "name": "Bob",
            "role": "doctor",
            "vitals": [{ "time": "not a time", "heartRate": "fast" }],
            "devices": "nope"
        });
        let profile = profile_from_document("u1", doc).unwrap();
        assert_eq!(profile.name, "Bob");
        assert_eq!(profile.role, Role::Doctor);
        assert!(profile.vitals.is_empty());
        assert!(profile.devices.is_empty());
    }

    #[test]
    fn non_object_document_is_invalid() {
        assert!(matches!(
            profile_from_document("u1", json!("nope")),
            Err(StoreError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn profile_round_trips_through_document() {
        let mut profile = Profile::new_patient("u1", "Ada", "ada@example.com", "a.png");
        profile.doctor_id = Some("docA".into());
        let doc = StoredProfile::from_profile(&profile).to_document().unwrap();
        assert!(doc.get("id").is_none());
        assert_eq!(doc["doctorId"], "docA");
        assert_eq!(profile_from_document("u1", doc).unwrap(), profile);
    }
}
