use crate::db::{profile_from_document, Document, ProfileStore, StoreError, StoredProfile};
use crate::models::{merge_readings, Profile, ProfileUpdate, Vital};

/// Field name of the doctor assignment inside a profile document.
pub const DOCTOR_ID_FIELD: &str = "doctorId";

const VITALS_FIELD: &str = "vitals";

/// Get a profile by id with every default applied.
pub fn get_profile(store: &dyn ProfileStore, id: &str) -> Result<Option<Profile>, StoreError> {
    match store.get(id)? {
        Some(doc) => Ok(Some(profile_from_document(id, doc)?)),
        None => Ok(None),
    }
}

/// Upsert the full profile document for `id`.
pub fn initialize_profile(
    store: &dyn ProfileStore,
    id: &str,
    profile: &Profile,
) -> Result<(), StoreError> {
    let doc = StoredProfile::from_profile(profile).to_document()?;
    store.put(id, &doc)
}

/// Write the profile only if `id` has no document yet. Returns `true` if
/// this call created it.
pub fn create_profile_if_absent(
    store: &dyn ProfileStore,
    id: &str,
    profile: &Profile,
) -> Result<bool, StoreError> {
    let doc = StoredProfile::from_profile(profile).to_document()?;
    store.insert_if_absent(id, &doc)
}

/// Merge only the fields present in `update` into the stored profile.
pub fn update_profile(
    store: &dyn ProfileStore,
    id: &str,
    update: &ProfileUpdate,
) -> Result<(), StoreError> {
    let patch = serde_json::to_value(update)?;
    store.merge(id, &patch)
}

/// Every profile whose `doctorId` equals `doctor_id`, sorted by name.
pub fn list_profiles_by_doctor(
    store: &dyn ProfileStore,
    doctor_id: &str,
) -> Result<Vec<Profile>, StoreError> {
    let docs = store.find_by_field(DOCTOR_ID_FIELD, doctor_id)?;
    normalize_all(docs)
}

/// Every profile in the store, sorted by name.
pub fn list_all_profiles(store: &dyn ProfileStore) -> Result<Vec<Profile>, StoreError> {
    normalize_all(store.list()?)
}

/// Merge new readings into the stored history (ascending by time).
/// Returns the number of readings stored after the merge.
///
/// The merge runs inside one store update, so concurrent appends to the
/// same profile never drop each other's readings.
pub fn append_vitals(
    store: &dyn ProfileStore,
    id: &str,
    mut readings: Vec<Vital>,
) -> Result<usize, StoreError> {
    let mut count = 0;
    store.update_document(id, &mut |doc| {
        let mut history = profile_from_document(id, doc.clone())?.vitals;
        merge_readings(&mut history, std::mem::take(&mut readings));
        count = history.len();
        let fields = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument { id: id.to_string() })?;
        fields.insert(VITALS_FIELD.to_string(), serde_json::to_value(&history)?);
        Ok(())
    })?;
    Ok(count)
}

/// Unreadable documents are logged and left out so one bad record never
/// hides the rest of a list.
fn normalize_all(docs: Vec<(String, Document)>) -> Result<Vec<Profile>, StoreError> {
    let mut profiles: Vec<Profile> = docs
        .into_iter()
        .filter_map(|(id, doc)| match profile_from_document(&id, doc) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(profile_id = %id, error = %e, "Skipping unreadable profile");
                None
            }
        })
        .collect();
    profiles.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(profiles)
}
