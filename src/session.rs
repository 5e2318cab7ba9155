//! Session/profile binding.
//!
//! Turns an authenticated identity into a stored profile (create-on-first-
//! login), tracks which identities are signed in, and maps a role to its
//! dashboard. Identity verification sits behind `IdentityProvider`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository;
use crate::db::ProfileStore;
use crate::models::{Profile, Role, DEFAULT_PROFILE_NAME, PLACEHOLDER_AVATAR_URL};
use crate::profiles::DataError;
use crate::seed;

// ═══════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid or revoked token")]
    InvalidToken,
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Verifies bearer tokens and resolves them to identities.
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, bearer: &str) -> Result<Identity, IdentityError>;

    /// Invalidate a bearer token on sign-out. Providers that cannot revoke
    /// return `false`.
    fn revoke(&self, _bearer: &str) -> bool {
        false
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// In-process identity provider. Tokens are kept only as SHA-256 hashes.
#[derive(Default)]
pub struct TokenIdentityProvider {
    identities: RwLock<HashMap<String, Identity>>,
    tokens: RwLock<HashMap<[u8; 32], String>>,
}

impl TokenIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an identity.
    pub fn register(&self, identity: Identity) -> Result<(), IdentityError> {
        self.identities
            .write()
            .map_err(|_| IdentityError::Unavailable("identity table lock poisoned".into()))?
            .insert(identity.id.clone(), identity);
        Ok(())
    }

    pub fn identity(&self, id: &str) -> Option<Identity> {
        self.identities.read().ok()?.get(id).cloned()
    }

    /// Issue a fresh bearer token for a registered identity.
    pub fn issue_token(&self, id: &str) -> Result<String, IdentityError> {
        if self.identity(id).is_none() {
            return Err(IdentityError::UnknownIdentity(id.to_string()));
        }
        let token = generate_token();
        self.tokens
            .write()
            .map_err(|_| IdentityError::Unavailable("token table lock poisoned".into()))?
            .insert(hash_token(&token), id.to_string());
        tracing::debug!(identity_id = id, "Bearer token issued");
        Ok(token)
    }

    /// Revoke a single token. Returns `true` if it was known.
    pub fn revoke_token(&self, token: &str) -> bool {
        self.tokens
            .write()
            .map(|mut tokens| tokens.remove(&hash_token(token)).is_some())
            .unwrap_or(false)
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn verify(&self, bearer: &str) -> Result<Identity, IdentityError> {
        if bearer.is_empty() {
            return Err(IdentityError::MissingToken);
        }
        let id = self
            .tokens
            .read()
            .map_err(|_| IdentityError::Unavailable("token table lock poisoned".into()))?
            .get(&hash_token(bearer))
            .cloned()
            .ok_or(IdentityError::InvalidToken)?;
        self.identity(&id)
            .ok_or(IdentityError::UnknownIdentity(id))
    }

    fn revoke(&self, bearer: &str) -> bool {
        self.revoke_token(bearer)
    }
}

// ═══════════════════════════════════════════════════════════
// Create-on-first-login
// ═══════════════════════════════════════════════════════════

/// Defaults applied to a profile created on first login.
#[derive(Debug, Clone)]
pub struct ProfileDefaults {
    pub avatar_url: String,
    /// Seed new profiles with the demo device list and a day of vitals.
    pub demo_data: bool,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            avatar_url: PLACEHOLDER_AVATAR_URL.to_string(),
            demo_data: false,
        }
    }
}

/// The profile a brand-new identity starts with.
pub fn initial_profile(identity: &Identity, defaults: &ProfileDefaults) -> Profile {
    let mut profile = Profile::new_patient(
        &identity.id,
        identity.display_name.as_deref().unwrap_or(DEFAULT_PROFILE_NAME),
        identity.email.as_deref().unwrap_or_default(),
        identity.photo_url.as_deref().unwrap_or(&defaults.avatar_url),
    );
    if defaults.demo_data {
        profile.devices = seed::demo_devices();
        profile.vitals = seed::demo_vitals(seed::NEW_PROFILE_DEMO_READINGS, Utc::now());
    }
    profile
}

/// Return the stored profile for `identity`, creating it on first login.
///
/// An existing profile is returned unchanged. Creation goes through
/// insert-if-absent, so concurrent first logins produce one record.
pub fn ensure_profile(
    store: &dyn ProfileStore,
    identity: &Identity,
    defaults: &ProfileDefaults,
) -> Result<Profile, DataError> {
    if let Some(existing) = repository::get_profile(store, &identity.id)? {
        return Ok(existing);
    }

    let profile = initial_profile(identity, defaults);
    let created = repository::create_profile_if_absent(store, &identity.id, &profile)?;
    if created {
        tracing::info!(profile_id = %identity.id, "Profile created on first login");
    } else {
        tracing::debug!(profile_id = %identity.id, "Profile created concurrently, reusing it");
    }

    repository::get_profile(store, &identity.id)?
        .ok_or_else(|| DataError::NotFound(identity.id.clone()))
}

// ═══════════════════════════════════════════════════════════
// Sign-in / sign-out binding
// ═══════════════════════════════════════════════════════════

/// Authentication state change reported by the identity provider.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Active(Profile),
    SignedOut,
}

/// A signed-in identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub session_id: Uuid,
    pub identity_id: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Binds identity events to stored profiles.
pub struct SessionBinding {
    store: Arc<dyn ProfileStore>,
    defaults: ProfileDefaults,
    active: RwLock<HashMap<String, ActiveSession>>,
}

impl SessionBinding {
    pub fn new(store: Arc<dyn ProfileStore>, defaults: ProfileDefaults) -> Self {
        Self {
            store,
            defaults,
            active: RwLock::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> &ProfileDefaults {
        &self.defaults
    }

    pub fn handle(&self, event: AuthEvent) -> Result<SessionState, DataError> {
        match event {
            AuthEvent::SignedIn(identity) => {
                let profile = ensure_profile(self.store.as_ref(), &identity, &self.defaults)?;
                self.active
                    .write()
                    .map_err(|_| DataError::StoreUnavailable("session table lock poisoned".into()))?
                    .entry(identity.id.clone())
                    .or_insert_with(|| ActiveSession {
                        session_id: Uuid::new_v4(),
                        identity_id: identity.id.clone(),
                        signed_in_at: Utc::now(),
                    });
                tracing::info!(profile_id = %identity.id, role = %profile.role, "Signed in");
                Ok(SessionState::Active(profile))
            }
            AuthEvent::SignedOut { id } => {
                let removed = self
                    .active
                    .write()
                    .map(|mut active| active.remove(&id).is_some())
                    .unwrap_or(false);
                tracing::info!(profile_id = %id, was_active = removed, "Signed out");
                Ok(SessionState::SignedOut)
            }
        }
    }

    pub fn session(&self, id: &str) -> Option<ActiveSession> {
        self.active.read().ok()?.get(id).cloned()
    }

    pub fn is_signed_in(&self, id: &str) -> bool {
        self.session(id).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.active.read().map(|a| a.len()).unwrap_or(0)
    }
}

/// Landing dashboard for each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardView {
    Admin,
    Doctor,
    Patient,
}

impl DashboardView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => DashboardView::Admin,
            Role::Doctor => DashboardView::Doctor,
            Role::Patient => DashboardView::Patient,
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            DashboardView::Admin => "/dashboard/admin",
            DashboardView::Doctor => "/dashboard/doctor",
            DashboardView::Patient => "/dashboard/patient",
        }
    }
}
