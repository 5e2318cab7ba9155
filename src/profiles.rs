//! Data access layer: authorized, validated profile operations.
//!
//! Every operation takes the invoking `Caller` and runs the access check
//! from `crate::authorization` before touching the store. Raw, unchecked
//! operations live in `crate::db::repository`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::authorization::{authorize, Action, Caller};
use crate::db::repository;
use crate::db::{ProfileStore, StoreError};
use crate::models::{readings_in_range, Profile, ProfileUpdate, Role, Vital};

/// Display names are trimmed and must fall within these bounds (chars).
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

/// Maximum readings accepted in one `record_vitals` call.
pub const MAX_READINGS_PER_BATCH: usize = 1000;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Not authorized to {0}")]
    Unauthorized(String),

    #[error("Invalid value: {0}")]
    Validation(String),

    #[error("Profile store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Stored profile is malformed: {0}")]
    Corrupt(String),
}

impl From<StoreError> for DataError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => DataError::NotFound(id),
            StoreError::InvalidEnum { field, value } => {
                DataError::Validation(format!("{value} is not a valid {field}"))
            }
            StoreError::Serialization(e) => DataError::Corrupt(e.to_string()),
            e @ StoreError::InvalidDocument { .. } => DataError::Corrupt(e.to_string()),
            e @ (StoreError::Sqlite(_)
            | StoreError::Unavailable(_)
            | StoreError::MigrationFailed { .. }) => DataError::StoreUnavailable(e.to_string()),
        }
    }
}

/// Validate and normalize a profile update (trims the name).
pub fn validate_update(update: ProfileUpdate) -> Result<ProfileUpdate, DataError> {
    let mut update = update;
    if let Some(name) = update.name.take() {
        let trimmed = name.trim().to_string();
        let chars = trimmed.chars().count();
        if chars < NAME_MIN_CHARS {
            return Err(DataError::Validation(format!(
                "Name must be at least {NAME_MIN_CHARS} characters"
            )));
        }
        if chars > NAME_MAX_CHARS {
            return Err(DataError::Validation(format!(
                "Name must be at most {NAME_MAX_CHARS} characters"
            )));
        }
        update.name = Some(trimmed);
    }
    if let Some(avatar_url) = &update.avatar_url {
        if avatar_url.trim().is_empty() {
            return Err(DataError::Validation("Avatar URL cannot be empty".into()));
        }
    }
    if let Some(Some(doctor_id)) = &update.doctor_id {
        if doctor_id.trim().is_empty() {
            return Err(DataError::Validation("Doctor id cannot be empty".into()));
        }
    }
    Ok(update)
}

/// Reject readings that cannot come from a real sensor.
pub fn validate_readings(readings: &[Vital]) -> Result<(), DataError> {
    if readings.is_empty() {
        return Err(DataError::Validation("No readings supplied".into()));
    }
    if readings.len() > MAX_READINGS_PER_BATCH {
        return Err(DataError::Validation(format!(
            "At most {MAX_READINGS_PER_BATCH} readings per request"
        )));
    }
    for v in readings {
        let in_range = |value: f64, low: f64, high: f64| value.is_finite() && (low..=high).contains(&value);
        if !in_range(v.heart_rate, 0.0, 300.0) {
            return Err(DataError::Validation(format!("Heart rate out of range: {}", v.heart_rate)));
        }
        if !in_range(v.temperature, 25.0, 45.0) {
            return Err(DataError::Validation(format!("Temperature out of range: {}", v.temperature)));
        }
        if !in_range(v.oxygen_saturation, 0.0, 100.0) {
            return Err(DataError::Validation(format!(
                "Oxygen saturation out of range: {}",
                v.oxygen_saturation
            )));
        }
        let bp = v.blood_pressure;
        if !in_range(bp.systolic, 20.0, 300.0) || !in_range(bp.diastolic, 10.0, 250.0) {
            return Err(DataError::Validation(format!(
                "Blood pressure out of range: {}/{}",
                bp.systolic, bp.diastolic
            )));
        }
    }
    Ok(())
}

/// Authorized access to the profile store.
#[derive(Clone)]
pub struct ProfileDirectory {
    store: Arc<dyn ProfileStore>,
}

impl ProfileDirectory {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn ProfileStore {
        self.store.as_ref()
    }

    /// Resolve the caller for an identity id from its stored role.
    pub fn caller(&self, id: &str) -> Result<Caller, DataError> {
        let profile = self.load(id)?;
        Ok(Caller::new(&profile.id, profile.role))
    }

    fn load(&self, id: &str) -> Result<Profile, DataError> {
        repository::get_profile(self.store(), id)?.ok_or_else(|| DataError::NotFound(id.to_string()))
    }

    /// Read a profile with defaults applied.
    ///
    /// A missing id is only reported as `NotFound` to callers who could
    /// read it if it existed; everyone else gets the usual denial.
    pub fn get_profile(&self, caller: &Caller, id: &str) -> Result<Profile, DataError> {
        let Some(profile) = repository::get_profile(self.store(), id)? else {
            if caller.is_admin() || caller.id == id {
                return Err(DataError::NotFound(id.to_string()));
            }
            tracing::warn!(caller_id = %caller.id, role = %caller.role, "Access denied");
            return Err(DataError::Unauthorized("read profile".into()));
        };
        authorize(caller, Action::ReadProfile { target: &profile })?;
        Ok(profile)
    }

    /// Merge the given fields into the profile and return the result.
    ///
    /// Settings fields are self-service; `role` and `doctorId` need an
    /// administrator. Doctor assignments must reference an existing doctor
    /// and may only be set on patient profiles.
    pub fn update_profile(
        &self,
        caller: &Caller,
        id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, DataError> {
        let mut update = validate_update(update)?;
        if update.touches_admin_fields() {
            authorize(caller, Action::AdministerProfile)?;
        } else {
            authorize(caller, Action::EditSettings { target_id: id })?;
        }

        let target = self.load(id)?;
        if update.touches_admin_fields() {
            self.check_role_change(&target, &mut update)?;
        }

        if update.is_empty() {
            return Ok(target);
        }

        repository::update_profile(self.store(), id, &update)?;
        tracing::info!(
            profile_id = id,
            caller_id = %caller.id,
            admin_fields = update.touches_admin_fields(),
            "Profile updated"
        );
        self.load(id)
    }

    /// Assign (or with `None`, clear) the doctor of a patient profile.
    pub fn assign_doctor(
        &self,
        caller: &Caller,
        patient_id: &str,
        doctor_id: Option<&str>,
    ) -> Result<Profile, DataError> {
        let update = ProfileUpdate {
            doctor_id: Some(doctor_id.map(str::to_string)),
            ..Default::default()
        };
        self.update_profile(caller, patient_id, update)
    }

    pub fn set_role(&self, caller: &Caller, id: &str, role: Role) -> Result<Profile, DataError> {
        let update = ProfileUpdate {
            role: Some(role),
            ..Default::default()
        };
        self.update_profile(caller, id, update)
    }

    /// Integrity rules for role/doctor changes. May add a `doctorId` clear
    /// to the update when a patient stops being a patient.
    fn check_role_change(
        &self,
        target: &Profile,
        update: &mut ProfileUpdate,
    ) -> Result<(), DataError> {
        let new_role = update.role.unwrap_or(target.role);

        if target.role == Role::Doctor && new_role != Role::Doctor {
            let roster = repository::list_profiles_by_doctor(self.store(), &target.id)?;
            if !roster.is_empty() {
                return Err(DataError::Validation(format!(
                    "Doctor {} still has {} assigned patient(s)",
                    target.id,
                    roster.len()
                )));
            }
        }

        match &update.doctor_id {
            Some(Some(doctor_id)) => {
                if new_role != Role::Patient {
                    return Err(DataError::Validation(
                        "Only patient profiles can be assigned a doctor".into(),
                    ));
                }
                if doctor_id == &target.id {
                    return Err(DataError::Validation(
                        "A profile cannot be its own doctor".into(),
                    ));
                }
                let doctor = repository::get_profile(self.store(), doctor_id)?;
                match doctor {
                    Some(d) if d.role == Role::Doctor => {}
                    Some(_) => {
                        return Err(DataError::Validation(format!(
                            "Profile {doctor_id} is not a doctor"
                        )))
                    }
                    None => {
                        return Err(DataError::Validation(format!(
                            "Doctor {doctor_id} does not exist"
                        )))
                    }
                }
            }
            Some(None) => {}
            None => {
                if new_role != Role::Patient && target.doctor_id.is_some() {
                    update.doctor_id = Some(None);
                }
            }
        }
        Ok(())
    }

    /// Patients assigned to `doctor_id`. The doctor themself or an admin.
    pub fn list_profiles_by_doctor(
        &self,
        caller: &Caller,
        doctor_id: &str,
    ) -> Result<Vec<Profile>, DataError> {
        authorize(caller, Action::ListDoctorRoster { doctor_id })?;
        Ok(repository::list_profiles_by_doctor(self.store(), doctor_id)?)
    }

    /// Every profile. Administrators only.
    pub fn list_all_profiles(&self, caller: &Caller) -> Result<Vec<Profile>, DataError> {
        authorize(caller, Action::ListAllProfiles)?;
        Ok(repository::list_all_profiles(self.store())?)
    }

    /// Append readings to a patient's history. Returns the stored count.
    pub fn record_vitals(
        &self,
        caller: &Caller,
        id: &str,
        readings: Vec<Vital>,
    ) -> Result<usize, DataError> {
        validate_readings(&readings)?;
        authorize(caller, Action::RecordVitals { target_id: id })?;
        let target = self.load(id)?;
        if target.role != Role::Patient {
            return Err(DataError::Validation(
                "Vitals can only be recorded for patient profiles".into(),
            ));
        }
        let added = readings.len();
        let count = repository::append_vitals(self.store(), id, readings)?;
        tracing::debug!(profile_id = id, added, total = count, "Vitals recorded");
        Ok(count)
    }

    /// Readings in `[start, end]` for a readable profile.
    pub fn vitals_in_range(
        &self,
        caller: &Caller,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Vital>, DataError> {
        if start > end {
            return Err(DataError::Validation("Range start is after its end".into()));
        }
        let profile = self.get_profile(caller, id)?;
        Ok(readings_in_range(&profile.vitals, start, end))
    }
}
