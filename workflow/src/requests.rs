//! Request lifecycle: creation, signatures, deletion and queries.

use std::cmp::Reverse;
use std::collections::HashSet;

use diploma_store::{DiplomaStore, RequestEntry, StoreError};
use diploma_types::{
    DiplomaRequest, Identity, RequestId, RequestStatus, SignatureRecord, TemplateId,
};

use crate::event::WorkflowEvent;
use crate::machine;
use crate::{DiplomaWorkflow, WorkflowError};

/// Input for a new request. Signers are already canonical identities.
#[derive(Clone, Debug)]
pub struct NewRequest {
    pub diploma_id: TemplateId,
    pub student_ids: Vec<String>,
    pub required_signers: Vec<Identity>,
    pub comment: Option<String>,
}

/// Order-preserving de-duplication.
fn dedup<T: Clone + Eq + std::hash::Hash>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn newest_first(entries: &mut [RequestEntry]) {
    entries.sort_by_key(|e| Reverse(e.request.created_at));
}

impl<S: DiplomaStore> DiplomaWorkflow<S> {
    /// Create a `Pending` request with one unsigned row per required signer.
    pub fn create_request(
        &self,
        new: NewRequest,
        creator: &Identity,
    ) -> Result<RequestEntry, WorkflowError> {
        let student_ids = dedup(
            new.student_ids
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
        if student_ids.is_empty() {
            return Err(WorkflowError::BadRequest(
                "at least one student id is required".into(),
            ));
        }
        let required_signatures = dedup(new.required_signers);
        if required_signatures.is_empty() {
            return Err(WorkflowError::BadRequest(
                "at least one required signer is required".into(),
            ));
        }
        if !self.store.template_exists(&new.diploma_id)? {
            return Err(WorkflowError::NotFound(format!(
                "template {}",
                new.diploma_id
            )));
        }

        let now = self.now();
        let id = RequestId::generate();
        let signatures = required_signatures
            .iter()
            .map(|signer| SignatureRecord::unsigned(id, signer.clone(), now))
            .collect();
        let entry = RequestEntry {
            request: DiplomaRequest {
                id,
                diploma_id: new.diploma_id,
                created_by: creator.clone(),
                student_ids,
                comment: new
                    .comment
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
                required_signatures,
                status: RequestStatus::Pending,
                valid_signatures: 0,
                anchor_requested: false,
                anchor_batch_id: None,
                anchor_diplome_label: None,
                anchor_requested_by: None,
                anchor_tx_hash: None,
                created_at: now,
                updated_at: now,
            },
            signatures,
            attestations: Vec::new(),
        };

        self.store.create_entry(&entry).map_err(|e| match e {
            StoreError::Duplicate(key) => WorkflowError::Internal(format!("id collision on {key}")),
            other => other.into(),
        })?;

        tracing::info!(
            request_id = %id,
            created_by = %creator,
            signers = entry.request.required_count(),
            students = entry.request.student_ids.len(),
            "diploma request created"
        );
        self.emit(WorkflowEvent::RequestCreated {
            request_id: id,
            created_by: creator.clone(),
        });
        Ok(entry)
    }

    /// Record a signer's approval or refusal and return the updated entry.
    pub fn sign(
        &self,
        id: &RequestId,
        signer: &Identity,
        approve: bool,
        comment: Option<String>,
    ) -> Result<RequestEntry, WorkflowError> {
        let now = self.now();
        let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        let (previous, entry) = self.store.update_entry(id, |entry| {
            let previous = machine::apply_signature(entry, signer, approve, comment, now)?;
            Ok::<_, WorkflowError>((previous, entry.clone()))
        })?;

        let status = entry.request.status;
        tracing::info!(
            request_id = %id,
            signer = %signer,
            approve,
            valid_signatures = entry.request.valid_signatures,
            required = entry.request.required_count(),
            %status,
            "signature recorded"
        );
        self.emit(WorkflowEvent::SignatureRecorded {
            request_id: *id,
            signer: signer.clone(),
            approve,
        });
        if status != previous {
            self.emit(WorkflowEvent::StatusChanged {
                request_id: *id,
                from: previous,
                to: status,
            });
        }
        Ok(entry)
    }

    /// Delete a `Pending` request owned by `caller`, with all its rows.
    pub fn delete(&self, id: &RequestId, caller: &Identity) -> Result<(), WorkflowError> {
        let removed = self
            .store
            .delete_entry(id, |entry| machine::check_deletable(entry, caller))?;
        tracing::info!(
            request_id = %id,
            caller = %caller,
            signatures = removed.signatures.len(),
            "diploma request deleted"
        );
        self.emit(WorkflowEvent::RequestDeleted { request_id: *id });
        Ok(())
    }

    /// All requests, newest first.
    pub fn list(&self) -> Result<Vec<RequestEntry>, WorkflowError> {
        let mut entries = self.store.iter_entries()?;
        newest_first(&mut entries);
        Ok(entries)
    }

    pub fn get(&self, id: &RequestId) -> Result<RequestEntry, WorkflowError> {
        Ok(self.store.get_entry(id)?)
    }

    /// Requests `identity` created or must sign, newest first.
    pub fn list_for_user(&self, identity: &Identity) -> Result<Vec<RequestEntry>, WorkflowError> {
        let mut entries: Vec<_> = self
            .store
            .iter_entries()?
            .into_iter()
            .filter(|e| e.request.involves(identity))
            .collect();
        newest_first(&mut entries);
        Ok(entries)
    }

    /// Whether `identity` could sign the request right now.
    pub fn can_sign(&self, id: &RequestId, identity: &Identity) -> Result<bool, WorkflowError> {
        let entry = self.store.get_entry(id)?;
        let already_signed = entry.signature(identity).is_some_and(|row| row.is_signed);
        Ok(entry.request.is_required_signer(identity)
            && !already_signed
            && entry.request.status.accepts_signatures())
    }
}
