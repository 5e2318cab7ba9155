//! Demo data: generated vitals, the static device list, and the demo roster
//! (one admin, one doctor, two assigned patients).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::db::repository;
use crate::db::ProfileStore;
use crate::models::{
    BloodPressure, Device, NotificationPreferences, Profile, Role, SignalStrength, Vital,
    PLACEHOLDER_AVATAR_URL,
};
use crate::profiles::DataError;
use crate::session::{Identity, IdentityError, TokenIdentityProvider};

/// Hourly readings given to a new profile when demo data is enabled.
pub const NEW_PROFILE_DEMO_READINGS: usize = 25;

/// Hourly readings (one week) given to each roster patient.
pub const ROSTER_PATIENT_READINGS: usize = 168;

/// `count` hourly readings ending at `now`, ascending by time.
pub fn demo_vitals(count: usize, now: DateTime<Utc>) -> Vec<Vital> {
    let mut rng = rand::thread_rng();
    (0..count)
        .rev()
        .map(|hours_ago| Vital {
            time: now - Duration::hours(hours_ago as i64),
            heart_rate: f64::from(rng.gen_range(50_u8..75)),
            temperature: 36.5 + rng.gen_range(-1.0_f64..1.0),
            oxygen_saturation: f64::from(rng.gen_range(95_u8..100)),
            blood_pressure: BloodPressure {
                systolic: f64::from(rng.gen_range(100_u8..120)),
                diastolic: f64::from(rng.gen_range(60_u8..80)),
            },
        })
        .collect()
}

pub fn demo_devices() -> Vec<Device> {
    [
        ("sw01", "SmartWatch 7", 82, "2m ago"),
        ("sp02", "SmartPatch+", 95, "1m ago"),
        ("si03", "Neural-Implant X", 100, "<1m ago"),
    ]
    .into_iter()
    .map(|(id, name, battery, last_sync)| Device {
        id: id.to_string(),
        name: name.to_string(),
        battery,
        signal: SignalStrength::Strong,
        last_sync: last_sync.to_string(),
    })
    .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl From<crate::db::StoreError> for SeedError {
    fn from(err: crate::db::StoreError) -> Self {
        SeedError::Data(err.into())
    }
}

struct DemoUser {
    email: &'static str,
    name: &'static str,
    role: Role,
}

const DEMO_USERS: [DemoUser; 4] = [
    DemoUser {
        email: "admin@bioscan.io",
        name: "Admin User",
        role: Role::Admin,
    },
    DemoUser {
        email: "doctor@bioscan.io",
        name: "Dr. Eleanor Vance",
        role: Role::Doctor,
    },
    DemoUser {
        email: "marcus@bioscan.io",
        name: "Marcus Thorne",
        role: Role::Patient,
    },
    DemoUser {
        email: "isabelle@bioscan.io",
        name: "Isabelle Rossi",
        role: Role::Patient,
    },
];

/// One seeded identity and the bearer token issued for it.
#[derive(Debug, Clone, Serialize)]
pub struct SeededAccount {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub token: String,
    /// `false` when the profile already existed and was left in place.
    pub created: bool,
}

/// Create the demo roster, or reuse it if it already exists.
///
/// Existing profiles are matched by email and never overwritten; an
/// existing unassigned patient is assigned to the demo doctor.
pub fn populate_demo_roster(
    store: &dyn ProfileStore,
    identities: &TokenIdentityProvider,
) -> Result<Vec<SeededAccount>, SeedError> {
    tracing::info!("Populating demo roster");
    let mut doctor_id: Option<String> = None;
    let mut accounts = Vec::with_capacity(DEMO_USERS.len());

    for user in &DEMO_USERS {
        let existing = store.find_by_field("email", user.email)?;
        let (id, created) = match existing.into_iter().next() {
            Some((id, _)) => {
                tracing::info!(email = user.email, profile_id = %id, "Demo user already exists");
                (id, false)
            }
            None => (uuid::Uuid::new_v4().to_string(), true),
        };

        if user.role == Role::Doctor {
            doctor_id = Some(id.clone());
        }

        if created {
            let profile = demo_profile(&id, user, doctor_id.as_deref());
            repository::create_profile_if_absent(store, &id, &profile)?;
            tracing::info!(email = user.email, profile_id = %id, role = %user.role, "Demo profile created");
        } else if let Some(doctor) = &doctor_id {
            assign_if_unassigned(store, &id, doctor)?;
        }

        identities.register(Identity {
            id: id.clone(),
            display_name: Some(user.name.to_string()),
            email: Some(user.email.to_string()),
            photo_url: Some(PLACEHOLDER_AVATAR_URL.to_string()),
        })?;
        let token = identities.issue_token(&id)?;

        accounts.push(SeededAccount {
            id,
            email: user.email.to_string(),
            role: user.role,
            token,
            created,
        });
    }

    tracing::info!(accounts = accounts.len(), "Demo roster ready");
    Ok(accounts)
}

fn demo_profile(id: &str, user: &DemoUser, doctor_id: Option<&str>) -> Profile {
    let mut profile = Profile::new_patient(id, user.name, user.email, PLACEHOLDER_AVATAR_URL);
    profile.role = user.role;
    if user.role == Role::Patient {
        profile.vitals = demo_vitals(ROSTER_PATIENT_READINGS, Utc::now());
        profile.devices = demo_devices();
        profile.notification_preferences = NotificationPreferences {
            high_priority_alerts: true,
            new_recommendations: true,
        };
        profile.doctor_id = doctor_id.map(str::to_string);
    }
    profile
}

fn assign_if_unassigned(
    store: &dyn ProfileStore,
    id: &str,
    doctor_id: &str,
) -> Result<(), SeedError> {
    let Some(profile) = repository::get_profile(store, id)? else {
        return Ok(());
    };
    if profile.role == Role::Patient && profile.doctor_id.is_none() {
        let update = crate::models::ProfileUpdate {
            doctor_id: Some(Some(doctor_id.to_string())),
            ..Default::default()
        };
        repository::update_profile(store, id, &update)?;
        tracing::info!(profile_id = id, doctor_id, "Assigned existing patient to demo doctor");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryProfileStore;
    use crate::session::IdentityProvider;

    #[test]
    fn demo_vitals_are_hourly_and_ascending() {
        let now = Utc::now();
        let vitals = demo_vitals(NEW_PROFILE_DEMO_READINGS, now);
        assert_eq!(vitals.len(), 25);
        assert_eq!(vitals.last().unwrap().time, now);
        assert_eq!(vitals[0].time, now - Duration::hours(24));
        for v in &vitals {
            assert!((50.0..75.0).contains(&v.heart_rate));
            assert!((35.5..=37.5).contains(&v.temperature));
            assert!((95.0..=99.0).contains(&v.oxygen_saturation));
        }
    }

    #[test]
    fn demo_devices_are_fixed() {
        let ids: Vec<String> = demo_devices().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["sw01", "sp02", "si03"]);
    }

    #[test]
    fn roster_assigns_patients_to_doctor() {
        let store = MemoryProfileStore::new();
        let idp = TokenIdentityProvider::new();
        let accounts = populate_demo_roster(&store, &idp).unwrap();
        assert_eq!(accounts.len(), 4);
        assert!(accounts.iter().all(|a| a.created));

        let doctor = accounts.iter().find(|a| a.role == Role::Doctor).unwrap();
        let roster = repository::list_profiles_by_doctor(&store, &doctor.id).unwrap();
        let names: Vec<&str> = roster.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Isabelle Rossi", "Marcus Thorne"]);
        assert_eq!(roster[0].vitals.len(), ROSTER_PATIENT_READINGS);
        assert!(roster[0].notification_preferences.new_recommendations);
    }

    #[test]
    fn roster_tokens_verify_to_their_identity() {
        let store = MemoryProfileStore::new();
        let idp = TokenIdentityProvider::new();
        let accounts = populate_demo_roster(&store, &idp).unwrap();
        let admin = &accounts[0];
        let identity = idp.verify(&admin.token).unwrap();
        assert_eq!(identity.id, admin.id);
        assert_eq!(identity.email.as_deref(), Some("admin@bioscan.io"));
    }

    #[test]
    fn rerun_reuses_profiles_and_assigns_unassigned_patients() {
        let store = MemoryProfileStore::new();
        let idp = TokenIdentityProvider::new();
        let first = populate_demo_roster(&store, &idp).unwrap();
        let marcus = first.iter().find(|a| a.email == "marcus@bioscan.io").unwrap();
        store
            .merge(&marcus.id, &serde_json::json!({ "doctorId": null }))
            .unwrap();

        let second = populate_demo_roster(&store, &idp).unwrap();
        assert!(second.iter().all(|a| !a.created));
        assert_eq!(store.len(), 4);
        let ids: Vec<&str> = second.iter().map(|a| a.id.as_str()).collect();
        let first_ids: Vec<&str> = first.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, first_ids);

        let doctor = second.iter().find(|a| a.role == Role::Doctor).unwrap();
        let marcus_profile = repository::get_profile(&store, &marcus.id).unwrap().unwrap();
        assert_eq!(marcus_profile.doctor_id.as_deref(), Some(doctor.id.as_str()));
    }
}
