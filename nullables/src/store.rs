//! Nullable store: thread-safe in-memory storage for testing.

use diploma_store::{RequestEntry, RequestStore, StoreError, TemplateStore};
use diploma_types::{DiplomaRequest, DiplomaTemplate, RequestId, SignatureRecord, TemplateId};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    templates: HashMap<TemplateId, DiplomaTemplate>,
    entries: HashMap<RequestId, RequestEntry>,
}

/// An in-memory template + request store for testing.
///
/// Thread-safe for use with tokio's multi-threaded runtime. The mutex is held
/// for the whole of `update_entry`/`delete_entry`, which gives the same
/// one-writer-at-a-time behaviour as the LMDB backend. Closures passed to
/// those methods must not call back into the store.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for NullStore {
    fn put_template(&self, template: &DiplomaTemplate) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .templates
            .insert(template.id, template.clone());
        Ok(())
    }

    fn get_template(&self, id: &TemplateId) -> Result<DiplomaTemplate, StoreError> {
        self.state
            .lock()
            .unwrap()
            .templates
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("template {id}")))
    }

    fn template_exists(&self, id: &TemplateId) -> Result<bool, StoreError> {
        Ok(self.state.lock().unwrap().templates.contains_key(id))
    }

    fn iter_templates(&self) -> Result<Vec<DiplomaTemplate>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .templates
            .values()
            .cloned()
            .collect())
    }
}

impl RequestStore for NullStore {
    fn create_entry(&self, entry: &RequestEntry) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = entry.request.id;
        if state.entries.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("request {id}")));
        }
        state.entries.insert(id, entry.clone());
        Ok(())
    }

    fn get_request(&self, id: &RequestId) -> Result<DiplomaRequest, StoreError> {
        self.get_entry(id).map(|e| e.request)
    }

    fn get_entry(&self, id: &RequestId) -> Result<RequestEntry, StoreError> {
        self.state
            .lock()
            .unwrap()
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")))
    }

    fn iter_requests(&self) -> Result<Vec<DiplomaRequest>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .entries
            .values()
            .map(|e| e.request.clone())
            .collect())
    }

    fn get_signatures(&self, id: &RequestId) -> Result<Vec<SignatureRecord>, StoreError> {
        self.get_entry(id).map(|e| e.signatures)
    }

    fn iter_entries(&self) -> Result<Vec<RequestEntry>, StoreError> {
        Ok(self.state.lock().unwrap().entries.values().cloned().collect())
    }

    fn update_entry<T, E, F>(&self, id: &RequestId, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut RequestEntry) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut state = self.state.lock().unwrap();
        let current = state
            .entries
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")))?;
        let loaded_attestations = current.attestations.len();
        let mut entry = current.clone();

        let out = apply(&mut entry)?;

        // Attestations are append-only: keep what was stored, add the rest.
        let stored = state
            .entries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")))?;
        let keep = loaded_attestations.min(entry.attestations.len());
        let appended = entry.attestations.split_off(keep);
        stored.request = entry.request;
        for row in entry.signatures {
            match stored.signature_mut(&row.signer) {
                Some(existing) => *existing = row,
                None => stored.signatures.push(row),
            }
        }
        stored.attestations.extend(appended);
        Ok(out)
    }

    fn delete_entry<E, F>(&self, id: &RequestId, guard: F) -> Result<RequestEntry, E>
    where
        F: FnOnce(&RequestEntry) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .entries
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")))?;
        guard(entry)?;
        state
            .entries
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diploma_types::{Identity, RequestStatus, Timestamp};

    fn entry() -> RequestEntry {
        let id = RequestId::generate();
        let signer = Identity::new("alice").unwrap();
        RequestEntry {
            request: DiplomaRequest {
                id,
                diploma_id: TemplateId::generate(),
                created_by: Identity::new("registrar").unwrap(),
                student_ids: vec!["s1".into()],
                comment: None,
                required_signatures: vec![signer.clone()],
                status: RequestStatus::Pending,
                valid_signatures: 0,
                anchor_requested: false,
                anchor_batch_id: None,
                anchor_diplome_label: None,
                anchor_requested_by: None,
                anchor_tx_hash: None,
                created_at: Timestamp::new(1),
                updated_at: Timestamp::new(1),
            },
            signatures: vec![SignatureRecord::unsigned(id, signer, Timestamp::new(1))],
            attestations: Vec::new(),
        }
    }

    #[test]
    fn failed_update_leaves_entry_untouched() {
        let store = NullStore::new();
        let e = entry();
        store.create_entry(&e).unwrap();
        let result: Result<(), StoreError> = store.update_entry(&e.request.id, |entry| {
            entry.request.status = RequestStatus::Rejected;
            Err(StoreError::Backend("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.get_entry(&e.request.id).unwrap(), e);
    }

    #[test]
    fn delete_guard_can_refuse() {
        let store = NullStore::new();
        let e = entry();
        store.create_entry(&e).unwrap();
        let refused: Result<_, StoreError> =
            store.delete_entry(&e.request.id, |_| Err(StoreError::Backend("no".into())));
        assert!(refused.is_err());
        let removed: Result<_, StoreError> = store.delete_entry(&e.request.id, |_| Ok(()));
        assert_eq!(removed.unwrap(), e);
        assert_eq!(store.request_count().unwrap(), 0);
    }
}
