use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing;

use super::repository::DOCTOR_ID_FIELD;
use super::{Document, ProfileStore, StoreError};

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../resources/migrations/001_profiles.sql"),
    )];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| StoreError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap_or(0)
}

/// Profile store backed by a single SQLite connection.
///
/// Documents live in the `profiles` table as JSON text; merges run through
/// SQLite's `json_patch()` so a partial update is a single statement.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))
    }
}

fn encode(id: &str, doc: &Document) -> Result<String, StoreError> {
    if !doc.is_object() {
        return Err(StoreError::InvalidDocument { id: id.to_string() });
    }
    Ok(serde_json::to_string(doc)?)
}

fn decode_rows(
    rows: impl Iterator<Item = Result<(String, String), rusqlite::Error>>,
) -> Result<Vec<(String, Document)>, StoreError> {
    rows.map(|row| {
        let (id, raw) = row?;
        let doc: Document = serde_json::from_str(&raw)?;
        Ok((id, doc))
    })
    .collect()
}

impl ProfileStore for SqliteProfileStore {
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT doc FROM profiles WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn put(&self, id: &str, doc: &Document) -> Result<(), StoreError> {
        let raw = encode(id, doc)?;
        self.conn()?.execute(
            "INSERT INTO profiles (id, doc) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc, updated_at = datetime('now')",
            params![id, raw],
        )?;
        Ok(())
    }

    fn insert_if_absent(&self, id: &str, doc: &Document) -> Result<bool, StoreError> {
        let raw = encode(id, doc)?;
        let inserted = self.conn()?.execute(
            "INSERT INTO profiles (id, doc) VALUES (?1, ?2) ON CONFLICT(id) DO NOTHING",
            params![id, raw],
        )?;
        Ok(inserted == 1)
    }

    fn merge(&self, id: &str, patch: &Document) -> Result<(), StoreError> {
        let raw = encode(id, patch)?;
        let affected = self.conn()?.execute(
            "UPDATE profiles SET doc = json_patch(doc, ?2), updated_at = datetime('now')
             WHERE id = ?1",
            params![id, raw],
        )?;
        if affected == 0 {
            return Err(StoreError::profile_not_found(id));
        }
        Ok(())
    }

    fn update_document(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut Document) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let raw: Option<String> = tx
            .query_row(
                "SELECT doc FROM profiles WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Err(StoreError::profile_not_found(id));
        };
        let mut doc: Document = serde_json::from_str(&raw)?;
        apply(&mut doc)?;
        tx.execute(
            "UPDATE profiles SET doc = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, encode(id, &doc)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn find_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let conn = self.conn()?;
        // The doctor lookup uses a literal path so `idx_profiles_doctor_id`
        // applies.
        let rows = if field == DOCTOR_ID_FIELD {
            let mut stmt = conn.prepare(
                "SELECT id, doc FROM profiles
                 WHERE json_extract(doc, '$.doctorId') = ?1
                 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![value], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            decode_rows(rows)?
        } else {
            let mut stmt = conn.prepare(
                "SELECT id, doc FROM profiles
                 WHERE json_extract(doc, ?1) = ?2
                 ORDER BY id",
            )?;
            let path = format!("$.{field}");
            let rows = stmt.query_map(params![path, value], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            decode_rows(rows)?
        };
        Ok(rows)
    }

    fn list(&self) -> Result<Vec<(String, Document)>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, doc FROM profiles ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        decode_rows(rows)
    }
}
