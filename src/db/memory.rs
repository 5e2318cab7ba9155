//! In-process profile store. Used for tests and for running without a
//! database file.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use serde_json::{Map, Value};

use super::{Document, ProfileStore, StoreError};

pub struct MemoryProfileStore {
    docs: RwLock<BTreeMap<String, Document>>,
    available: AtomicBool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backing store going away (every call fails with
    /// `Unavailable` until restored).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".into()))
        }
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.check_available()?;
        self.docs
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.check_available()?;
        self.docs
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require_object(id: &str, doc: &Document) -> Result<(), StoreError> {
    if doc.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument { id: id.to_string() })
    }
}

/// RFC 7396 JSON merge patch, same semantics as SQLite's `json_patch()`.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.read()?.get(id).cloned())
    }

    fn put(&self, id: &str, doc: &Document) -> Result<(), StoreError> {
        require_object(id, doc)?;
        self.write()?.insert(id.to_string(), doc.clone());
        Ok(())
    }

    fn insert_if_absent(&self, id: &str, doc: &Document) -> Result<bool, StoreError> {
        require_object(id, doc)?;
        let mut docs = self.write()?;
        if docs.contains_key(id) {
            return Ok(false);
        }
        docs.insert(id.to_string(), doc.clone());
        Ok(true)
    }

    fn merge(&self, id: &str, patch: &Document) -> Result<(), StoreError> {
        require_object(id, patch)?;
        let mut docs = self.write()?;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::profile_not_found(id))?;
        merge_patch(doc, patch);
        Ok(())
    }

    fn update_document(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut Document) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut docs = self.write()?;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::profile_not_found(id))?;
        let mut updated = doc.clone();
        apply(&mut updated)?;
        require_object(id, &updated)?;
        *doc = updated;
        Ok(())
    }

    fn find_by_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .filter(|(_, doc)| doc.get(field).and_then(Value::as_str) == Some(value))
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect())
    }

    fn list(&self) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self
            .read()?
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_then_get() {
        let store = MemoryProfileStore::new();
        store.put("u1", &json!({ "name": "Ada" })).unwrap();
        assert_eq!(store.get("u1").unwrap(), Some(json!({ "name": "Ada" })));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn insert_if_absent_never_overwrites() {
        let store = MemoryProfileStore::new();
        assert!(store.insert_if_absent("u1", &json!({ "name": "first" })).unwrap());
        assert!(!store.insert_if_absent("u1", &json!({ "name": "second" })).unwrap());
        assert_eq!(store.get("u1").unwrap().unwrap()["name"], "first");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn merge_requires_existing_document() {
        let store = MemoryProfileStore::new();
        let err = store.merge("ghost", &json!({ "name": "x" })).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn merge_patch_semantics() {
        let mut doc = json!({ "name": "Ada", "doctorId": "d1", "prefs": { "a": true, "b": false } });
        merge_patch(&mut doc, &json!({ "doctorId": null, "prefs": { "b": true } }));
        assert_eq!(doc, json!({ "name": "Ada", "prefs": { "a": true, "b": true } }));
    }

    #[test]
    fn merge_patch_replaces_arrays() {
        let mut doc = json!({ "vitals": [1, 2] });
        merge_patch(&mut doc, &json!({ "vitals": [3] }));
        assert_eq!(doc, json!({ "vitals": [3] }));
    }

    #[test]
    fn update_document_discards_failed_changes() {
        let store = MemoryProfileStore::new();
        store.put("u1", &json!({ "name": "Ada" })).unwrap();
        let err = store
            .update_document("u1", &mut |doc| {
                doc["name"] = json!("Grace");
                Err(StoreError::InvalidDocument { id: "u1".into() })
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
        assert_eq!(store.get("u1").unwrap().unwrap()["name"], "Ada");

        let err = store.update_document("ghost", &mut |_| Ok(())).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn find_by_field_matches_strings_only() {
        let store = MemoryProfileStore::new();
        store.put("p1", &json!({ "doctorId": "docA" })).unwrap();
        store.put("p2", &json!({ "doctorId": "docB" })).unwrap();
        store.put("p3", &json!({})).unwrap();
        let found = store.find_by_field("doctorId", "docA").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "p1");
    }

    #[test]
    fn rejects_non_object_documents() {
        let store = MemoryProfileStore::new();
        let err = store.put("u1", &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
    }

    #[test]
    fn offline_store_reports_unavailable() {
        let store = MemoryProfileStore::new();
        store.set_available(false);
        assert!(matches!(store.get("u1"), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.list(), Err(StoreError::Unavailable(_))));
        store.set_available(true);
        assert!(store.get("u1").unwrap().is_none());
    }
}
