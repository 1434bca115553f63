//! Diploma requests, their signature rows and anchor attestations.

use serde::{Deserialize, Serialize};

use crate::{Identity, RequestId, RequestStatus, TemplateId, Timestamp};

/// One diploma-issuance approval workflow instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomaRequest {
    pub id: RequestId,
    pub diploma_id: TemplateId,
    pub created_by: Identity,
    /// Students the diploma is issued to, in submission order.
    pub student_ids: Vec<String>,
    pub comment: Option<String>,
    /// Fixed at creation, never mutated afterwards.
    pub required_signatures: Vec<Identity>,
    pub status: RequestStatus,
    /// Always equal to the number of signature rows with `is_signed == true`.
    pub valid_signatures: u32,
    pub anchor_requested: bool,
    pub anchor_batch_id: Option<String>,
    pub anchor_diplome_label: Option<String>,
    pub anchor_requested_by: Option<Identity>,
    pub anchor_tx_hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DiplomaRequest {
    pub fn required_count(&self) -> u32 {
        self.required_signatures.len() as u32
    }

    pub fn is_required_signer(&self, identity: &Identity) -> bool {
        self.required_signatures.contains(identity)
    }

    /// Whether `identity` created the request or must sign it.
    pub fn involves(&self, identity: &Identity) -> bool {
        &self.created_by == identity || self.is_required_signer(identity)
    }
}

/// A required signer's decision on one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub request_id: RequestId,
    pub signer: Identity,
    pub is_signed: bool,
    pub signature_comment: Option<String>,
    /// Time of the last write to this row.
    pub signed_at: Timestamp,
}

impl SignatureRecord {
    /// An unsigned placeholder row, created with the request.
    pub fn unsigned(request_id: RequestId, signer: Identity, now: Timestamp) -> Self {
        Self {
            request_id,
            signer,
            is_signed: false,
            signature_comment: None,
            signed_at: now,
        }
    }
}

/// Off-chain evidence that a signer intended to anchor a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorAttestation {
    pub request_id: RequestId,
    pub signer: Identity,
    pub message: String,
    pub signature: String,
    pub created_at: Timestamp,
}

/// The message a signer signs to attest an anchoring intent.
pub fn anchor_message(batch_id: &str, request_id: &RequestId) -> String {
    format!("Anchor diploma batch {batch_id} for request {request_id}")
}
