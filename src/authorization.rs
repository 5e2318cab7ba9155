//! Role-based access rules for profile data.
//!
//! Every rule lives here; callers never compare roles themselves. Checked
//! as a cascade, default-deny:
//! 1. Own profile → allowed for self-service actions
//! 2. Administrator → allowed for everything
//! 3. Assigned doctor → read access to their patients
//! 4. Default → DENY

use serde::Serialize;

use crate::models::{Profile, Role};
use crate::profiles::DataError;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// The authenticated identity invoking an operation, with the role loaded
/// from its stored profile (never taken from the client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: &str, role: Role) -> Self {
        Self {
            id: id.to_string(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An operation on profile data that needs an access check.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Read a full profile, including vitals.
    ReadProfile { target: &'a Profile },
    /// Change self-service settings (name, avatar, notifications).
    EditSettings { target_id: &'a str },
    /// Change role or doctor assignment.
    AdministerProfile,
    /// List the patients assigned to a doctor.
    ListDoctorRoster { doctor_id: &'a str },
    /// List every profile in the store.
    ListAllProfiles,
    /// Append readings to a patient's vitals history.
    RecordVitals { target_id: &'a str },
    /// Read the API access log.
    ViewAuditLog,
}

impl Action<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ReadProfile { .. } => "read_profile",
            Action::EditSettings { .. } => "edit_settings",
            Action::AdministerProfile => "administer_profile",
            Action::ListDoctorRoster { .. } => "list_doctor_roster",
            Action::ListAllProfiles => "list_all_profiles",
            Action::RecordVitals { .. } => "record_vitals",
            Action::ViewAuditLog => "view_audit_log",
        }
    }
}

/// Why access was granted (or denied) for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    OwnProfile,
    Administrator,
    AssignedDoctor,
    Denied,
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Authorization check
// ═══════════════════════════════════════════════════════════

/// Decide whether `caller` may perform `action`.
pub fn check_access(caller: &Caller, action: Action<'_>) -> AccessDecision {
    // Rule 1: own profile (self-service actions only)
    let own = match action {
        Action::ReadProfile { target } => target.id == caller.id,
        Action::EditSettings { target_id } => target_id == caller.id,
        Action::RecordVitals { target_id } => {
            target_id == caller.id && caller.role == Role::Patient
        }
        Action::ListDoctorRoster { doctor_id } => {
            doctor_id == caller.id && caller.role == Role::Doctor
        }
        Action::AdministerProfile | Action::ListAllProfiles | Action::ViewAuditLog => false,
    };
    if own {
        return AccessDecision::allow(AccessReason::OwnProfile);
    }

    // Rule 2: administrators
    if caller.is_admin() {
        return AccessDecision::allow(AccessReason::Administrator);
    }

    // Rule 3: a doctor reading one of their assigned patients
    if let Action::ReadProfile { target } = action {
        if caller.role == Role::Doctor && target.doctor_id.as_deref() == Some(caller.id.as_str())
        {
            return AccessDecision::allow(AccessReason::AssignedDoctor);
        }
    }

    // Rule 4: default deny
    AccessDecision::deny()
}

/// Run the access check and turn a denial into `DataError::Unauthorized`.
pub fn authorize(caller: &Caller, action: Action<'_>) -> Result<AccessReason, DataError> {
    let decision = check_access(caller, action);
    if decision.allowed {
        Ok(decision.reason)
    } else {
        tracing::warn!(
            caller_id = %caller.id,
            role = %caller.role,
            action = action.name(),
            "Access denied"
        );
        Err(DataError::Unauthorized(action.name().replace('_', " ")))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, role: Role, doctor_id: Option<&str>) -> Profile {
        let mut p = Profile::new_patient(id, id, "", "a.png");
        p.role = role;
        p.doctor_id = doctor_id.map(str::to_string);
        p
    }

    #[test]
    fn patient_reads_own_profile() {
        let caller = Caller::new("p1", Role::Patient);
        let target = profile("p1", Role::Patient, None);
        let decision = check_access(&caller, Action::ReadProfile { target: &target });
        assert!(decision.allowed);
        assert_eq!(decision.reason, AccessReason::OwnProfile);
    }

    #[test]
    fn patient_cannot_read_other_patient() {
        let caller = Caller::new("p1", Role::Patient);
        let target = profile("p2", Role::Patient, None);
        assert!(!check_access(&caller, Action::ReadProfile { target: &target }).allowed);
    }

    #[test]
    fn doctor_reads_assigned_patient_only() {
        let doctor = Caller::new("docA", Role::Doctor);
        let mine = profile("p1", Role::Patient, Some("docA"));
        let theirs = profile("p2", Role::Patient, Some("docB"));
        let decision = check_access(&doctor, Action::ReadProfile { target: &mine });
        assert_eq!(decision.reason, AccessReason::AssignedDoctor);
        assert!(!check_access(&doctor, Action::ReadProfile { target: &theirs }).allowed);
    }

    #[test]
    fn patient_claiming_doctor_id_gains_nothing() {
        // A patient whose own id matches another profile's doctorId is still
        // not a doctor.
        let caller = Caller::new("p1", Role::Patient);
        let target = profile("p2", Role::Patient, Some("p1"));
        assert!(!check_access(&caller, Action::ReadProfile { target: &target }).allowed);
    }

    #[test]
    fn only_admin_lists_all_profiles() {
        for role in [Role::Patient, Role::Doctor] {
            assert!(!check_access(&Caller::new("x", role), Action::ListAllProfiles).allowed);
        }
        let decision = check_access(&Caller::new("root", Role::Admin), Action::ListAllProfiles);
        assert_eq!(decision.reason, AccessReason::Administrator);
    }

    #[test]
    fn only_admin_views_audit_log() {
        assert!(!check_access(&Caller::new("docA", Role::Doctor), Action::ViewAuditLog).allowed);
        assert!(check_access(&Caller::new("root", Role::Admin), Action::ViewAuditLog).allowed);
    }

    #[test]
    fn doctor_lists_only_own_roster() {
        let doctor = Caller::new("docA", Role::Doctor);
        assert!(check_access(&doctor, Action::ListDoctorRoster { doctor_id: "docA" }).allowed);
        assert!(!check_access(&doctor, Action::ListDoctorRoster { doctor_id: "docB" }).allowed);
        let patient = Caller::new("docA", Role::Patient);
        assert!(!check_access(&patient, Action::ListDoctorRoster { doctor_id: "docA" }).allowed);
    }

    #[test]
    fn settings_are_self_service_or_admin() {
        let caller = Caller::new("p1", Role::Patient);
        assert!(check_access(&caller, Action::EditSettings { target_id: "p1" }).allowed);
        assert!(!check_access(&caller, Action::EditSettings { target_id: "p2" }).allowed);
        let admin = Caller::new("root", Role::Admin);
        assert!(check_access(&admin, Action::EditSettings { target_id: "p2" }).allowed);
    }

    #[test]
    fn administering_requires_admin_even_for_self() {
        let doctor = Caller::new("docA", Role::Doctor);
        assert!(!check_access(&doctor, Action::AdministerProfile).allowed);
        let patient = Caller::new("p1", Role::Patient);
        assert!(!check_access(&patient, Action::AdministerProfile).allowed);
    }

    #[test]
    fn vitals_are_recorded_by_owning_patient() {
        let patient = Caller::new("p1", Role::Patient);
        assert!(check_access(&patient, Action::RecordVitals { target_id: "p1" }).allowed);
        assert!(!check_access(&patient, Action::RecordVitals { target_id: "p2" }).allowed);
        let doctor = Caller::new("docA", Role::Doctor);
        assert!(!check_access(&doctor, Action::RecordVitals { target_id: "docA" }).allowed);
    }

    #[test]
    fn authorize_maps_denial_to_unauthorized() {
        let patient = Caller::new("p1", Role::Patient);
        let err = authorize(&patient, Action::ListAllProfiles).unwrap_err();
        assert!(matches!(err, DataError::Unauthorized(msg) if msg == "list all profiles"));
        let admin = Caller::new("root", Role::Admin);
        assert_eq!(
            authorize(&admin, Action::ListAllProfiles).unwrap(),
            AccessReason::Administrator
        );
    }

    #[test]
    fn action_names_are_stable() {
        assert_eq!(Action::ListAllProfiles.name(), "list_all_profiles");
        assert_eq!(Action::AdministerProfile.name(), "administer_profile");
    }
}
