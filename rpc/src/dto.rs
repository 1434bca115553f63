//! JSON request and response bodies. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use diploma_store::RequestEntry;
use diploma_types::{
    AnchorAttestation, DiplomaRequest, DiplomaTemplate, RequestStatus, SignatureRecord,
};
use diploma_workflow::{AnchorPayload, NewTemplate};

// ── Templates ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub level: String,
    pub field: String,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<CreateTemplateBody> for NewTemplate {
    fn from(body: CreateTemplateBody) -> Self {
        NewTemplate {
            name: body.name,
            description: body.description,
            level: body.level,
            field: body.field,
            is_active: body.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub level: String,
    pub field: String,
    pub is_active: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<DiplomaTemplate> for TemplateResponse {
    fn from(t: DiplomaTemplate) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name,
            description: t.description,
            level: t.level,
            field: t.field,
            is_active: t.is_active,
            created_at: t.created_at.as_secs(),
            updated_at: t.updated_at.as_secs(),
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub diploma_id: String,
    pub student_ids: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Wallet addresses or user ids, depending on the deployment.
    pub required_signatures: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignBody {
    pub approve: bool,
    #[serde(default)]
    pub signature_comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    pub signer: String,
    pub is_signed: bool,
    pub signature_comment: Option<String>,
    pub signed_at: u64,
}

impl From<SignatureRecord> for SignatureResponse {
    fn from(s: SignatureRecord) -> Self {
        Self {
            signer: s.signer.to_string(),
            is_signed: s.is_signed,
            signature_comment: s.signature_comment,
            signed_at: s.signed_at.as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: String,
    pub diploma_id: String,
    pub created_by: String,
    pub student_ids: Vec<String>,
    pub comment: Option<String>,
    pub required_signatures: Vec<String>,
    pub status: RequestStatus,
    pub valid_signatures: u32,
    pub anchor_requested: bool,
    pub anchor_batch_id: Option<String>,
    pub anchor_diplome_label: Option<String>,
    pub anchor_requested_by: Option<String>,
    pub anchor_tx_hash: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
    pub signatures: Vec<SignatureResponse>,
}

impl From<RequestEntry> for RequestResponse {
    fn from(entry: RequestEntry) -> Self {
        let DiplomaRequest {
            id,
            diploma_id,
            created_by,
            student_ids,
            comment,
            required_signatures,
            status,
            valid_signatures,
            anchor_requested,
            anchor_batch_id,
            anchor_diplome_label,
            anchor_requested_by,
            anchor_tx_hash,
            created_at,
            updated_at,
        } = entry.request;
        Self {
            id: id.to_string(),
            diploma_id: diploma_id.to_string(),
            created_by: created_by.to_string(),
            student_ids,
            comment,
            required_signatures: required_signatures.iter().map(ToString::to_string).collect(),
            status,
            valid_signatures,
            anchor_requested,
            anchor_batch_id,
            anchor_diplome_label,
            anchor_requested_by: anchor_requested_by.map(|i| i.to_string()),
            anchor_tx_hash,
            created_at: created_at.as_secs(),
            updated_at: updated_at.as_secs(),
            signatures: entry.signatures.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanSignResponse {
    pub can_sign: bool,
    /// The caller's canonical identity.
    pub wallet_address: String,
}

// ── Anchoring ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRequestBody {
    pub batch_id: String,
    pub diplome_label: String,
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAnchorBody {
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    pub signer: String,
    pub message: String,
    pub signature: String,
    pub created_at: u64,
}

impl From<AnchorAttestation> for AttestationResponse {
    fn from(a: AnchorAttestation) -> Self {
        Self {
            signer: a.signer.to_string(),
            message: a.message,
            signature: a.signature,
            created_at: a.created_at.as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorPayloadResponse {
    pub request_id: String,
    pub batch_id: String,
    pub diplome_label: String,
    pub student_ids: Vec<String>,
    pub attestations: Vec<AttestationResponse>,
}

impl From<AnchorPayload> for AnchorPayloadResponse {
    fn from(p: AnchorPayload) -> Self {
        Self {
            request_id: p.request_id.to_string(),
            batch_id: p.batch_id,
            diplome_label: p.diplome_label,
            student_ids: p.student_ids,
            attestations: p.attestations.into_iter().map(Into::into).collect(),
        }
    }
}
