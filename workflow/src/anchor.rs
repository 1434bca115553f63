//! Anchor coordination: locking a request for a batch, the confirmation
//! callback from the anchoring process, and the payload it consumes.

use diploma_store::{DiplomaStore, RequestEntry};
use diploma_types::{AnchorAttestation, Identity, RequestId};

use crate::event::WorkflowEvent;
use crate::machine;
use crate::{DiplomaWorkflow, WorkflowError};

/// Input for [`DiplomaWorkflow::request_anchor`].
#[derive(Clone, Debug)]
pub struct AnchorRequest {
    pub batch_id: String,
    pub diplome_label: String,
    /// Signer and signature of an optional attestation; both or neither.
    pub signer: Option<Identity>,
    pub signature: Option<String>,
}

impl AnchorRequest {
    fn validate(&self) -> Result<(), WorkflowError> {
        if self.batch_id.trim().is_empty() {
            return Err(WorkflowError::BadRequest("batchId must not be empty".into()));
        }
        let signature_given = self
            .signature
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if self.signer.is_some() != signature_given {
            return Err(WorkflowError::BadRequest(
                "signer and signature must be supplied together".into(),
            ));
        }
        Ok(())
    }

    /// The attestation pair, when both halves are present.
    pub fn attestation(&self) -> Option<(&Identity, &str)> {
        let signature = self.signature.as_deref().map(str::trim)?;
        if signature.is_empty() {
            return None;
        }
        Some((self.signer.as_ref()?, signature))
    }
}

/// What the anchoring process needs to build its transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorPayload {
    pub request_id: RequestId,
    pub batch_id: String,
    pub diplome_label: String,
    pub student_ids: Vec<String>,
    pub attestations: Vec<AnchorAttestation>,
}

impl<S: DiplomaStore> DiplomaWorkflow<S> {
    /// Lock an approved request for anchoring. Exactly one call succeeds.
    pub fn request_anchor(
        &self,
        id: &RequestId,
        anchor: AnchorRequest,
        caller: &Identity,
    ) -> Result<RequestEntry, WorkflowError> {
        anchor.validate()?;
        let now = self.now();
        let entry = self.store.update_entry(id, |entry| {
            machine::apply_anchor_request(entry, &anchor, caller, now)?;
            Ok::<_, WorkflowError>(entry.clone())
        })?;

        tracing::info!(
            request_id = %id,
            batch_id = %anchor.batch_id,
            caller = %caller,
            attested = anchor.attestation().is_some(),
            "anchoring requested"
        );
        self.emit(WorkflowEvent::AnchorRequested {
            request_id: *id,
            batch_id: anchor.batch_id,
        });
        Ok(entry)
    }

    /// Record the anchoring transaction. Succeeds exactly once per request.
    pub fn confirm_anchored(
        &self,
        id: &RequestId,
        tx_hash: &str,
    ) -> Result<RequestEntry, WorkflowError> {
        let tx_hash = tx_hash.trim();
        if tx_hash.is_empty() {
            return Err(WorkflowError::BadRequest("txHash must not be empty".into()));
        }
        let now = self.now();
        let (previous, entry) = self.store.update_entry(id, |entry| {
            let previous = machine::apply_anchor_confirmation(entry, tx_hash, now)?;
            Ok::<_, WorkflowError>((previous, entry.clone()))
        })?;

        tracing::info!(request_id = %id, tx_hash, "anchoring confirmed");
        self.emit(WorkflowEvent::StatusChanged {
            request_id: *id,
            from: previous,
            to: entry.request.status,
        });
        Ok(entry)
    }

    pub fn anchor_payload(&self, id: &RequestId) -> Result<AnchorPayload, WorkflowError> {
        let entry = self.store.get_entry(id)?;
        let request = entry.request;
        if !request.anchor_requested {
            return Err(WorkflowError::AnchorNotRequested(request.id));
        }
        Ok(AnchorPayload {
            request_id: request.id,
            batch_id: request.anchor_batch_id.unwrap_or_default(),
            diplome_label: request.anchor_diplome_label.unwrap_or_default(),
            student_ids: request.student_ids,
            attestations: entry.attestations,
        })
    }
}
