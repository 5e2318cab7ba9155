//! Shared application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc`, and handed to
//! the HTTP layer. It owns the store handle and every service built on it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::advisory::AdvisoryService;
use crate::authorization::Caller;
use crate::db::ProfileStore;
use crate::profiles::{DataError, ProfileDirectory};
use crate::session::{ensure_profile, Identity, IdentityProvider, ProfileDefaults, SessionBinding};

/// Entries kept in the audit buffer; older ones are dropped first.
const AUDIT_BUFFER_CAPACITY: usize = 1000;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    store: Arc<dyn ProfileStore>,
    directory: ProfileDirectory,
    sessions: SessionBinding,
    identity: Arc<dyn IdentityProvider>,
    advisory: Arc<AdvisoryService>,
    audit: AuditLogger,
    /// Identifies this server process in logs and `/api/health`.
    pub instance_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl CoreState {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityProvider>,
        advisory: AdvisoryService,
        defaults: ProfileDefaults,
    ) -> Self {
        Self {
            directory: ProfileDirectory::new(store.clone()),
            sessions: SessionBinding::new(store.clone(), defaults),
            store,
            identity,
            advisory: Arc::new(advisory),
            audit: AuditLogger::new(),
            instance_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    pub fn store(&self) -> &dyn ProfileStore {
        self.store.as_ref()
    }

    pub fn directory(&self) -> &ProfileDirectory {
        &self.directory
    }

    pub fn sessions(&self) -> &SessionBinding {
        &self.sessions
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// Shared handle, for moving into `spawn_blocking`.
    pub fn advisory(&self) -> Arc<AdvisoryService> {
        Arc::clone(&self.advisory)
    }

    /// Make sure `identity` has a profile and resolve its caller.
    pub fn resolve_caller(&self, identity: &Identity) -> Result<Caller, DataError> {
        let profile = ensure_profile(self.store(), identity, self.sessions.defaults())?;
        Ok(Caller::new(&profile.id, profile.role))
    }

    // ── Audit ───────────────────────────────────────────────

    pub fn log_access(&self, caller_id: &str, action: &str, entity: &str, status: u16) {
        self.audit.log(caller_id, action, entity, status);
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }
}

// ═══════════════════════════════════════════════════════════
// Audit logger
// ═══════════════════════════════════════════════════════════

/// In-memory, bounded audit trail of API data access.
pub struct AuditLogger {
    buffer: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub caller_id: String,
    pub action: String,
    pub entity: String,
    pub status: u16,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self::with_capacity(AUDIT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn log(&self, caller_id: &str, action: &str, entity: &str, status: u16) {
        if let Ok(mut buf) = self.buffer.lock() {
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(AuditEntry {
                timestamp: Utc::now(),
                caller_id: caller_id.to_string(),
                action: action.to_string(),
                entity: entity.to_string(),
                status,
            });
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default()
    }

}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
