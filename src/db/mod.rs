pub mod document;
pub mod memory;
pub mod repository;
pub mod sqlite;

pub use document::*;
pub use memory::*;
pub use sqlite::*;

use thiserror::Error;

/// A stored profile document: a JSON object keyed by field name.
pub type Document = serde_json::Value;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Profile store unavailable: {0}")]
    Unavailable(String),

    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Stored document for {id} is not a JSON object")]
    InvalidDocument { id: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}

impl StoreError {
    pub(crate) fn profile_not_found(id: &str) -> Self {
        StoreError::NotFound {
            entity_type: "profile".into(),
            id: id.to_string(),
        }
    }
}

/// Document store holding one JSON document per user id.
///
/// Implementations must make every write keyed by id, so concurrent writers
/// to the same id collapse onto one document (last write wins).
pub trait ProfileStore: Send + Sync {
    /// Read the raw document for `id`.
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Upsert: create or fully replace the document for `id`.
    fn put(&self, id: &str, doc: &Document) -> Result<(), StoreError>;

    /// Create the document only if none exists. Returns `true` if created.
    fn insert_if_absent(&self, id: &str, doc: &Document) -> Result<bool, StoreError>;

    /// Apply a JSON merge patch (RFC 7396) to an existing document.
    /// `null` members remove the field. Fails with `NotFound` if absent.
    fn merge(&self, id: &str, patch: &Document) -> Result<(), StoreError>;

    /// Read, modify and write back one existing document as a single
    /// atomic step. No other write to `id` can interleave with `apply`.
    /// Fails with `NotFound` if absent.
    fn update_document(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut Document) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    /// Documents whose top-level string field `field` equals `value`.
    fn find_by_field(&self, field: &str, value: &str)
        -> Result<Vec<(String, Document)>, StoreError>;

    /// Every document in the store.
    fn list(&self) -> Result<Vec<(String, Document)>, StoreError>;
}
