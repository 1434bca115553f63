//! Transition rules for a single request.
//!
//! These functions only inspect and mutate a [`RequestEntry`]; the caller runs
//! them inside the store's unit of work so that the checks and the writes are
//! one atomic step.

use diploma_store::RequestEntry;
use diploma_types::{
    anchor_message, AnchorAttestation, Identity, RequestStatus, SignatureRecord, Timestamp,
};

use crate::anchor::AnchorRequest;
use crate::WorkflowError;

/// Record `signer`'s decision and recompute the request status.
///
/// Checks run in a fixed order: the signer must be required, must not have
/// signed already, and the request must still be `Pending`. Returns the status
/// the request had before the call.
pub fn apply_signature(
    entry: &mut RequestEntry,
    signer: &Identity,
    approve: bool,
    comment: Option<String>,
    now: Timestamp,
) -> Result<RequestStatus, WorkflowError> {
    let request_id = entry.request.id;
    if !entry.request.is_required_signer(signer) {
        return Err(WorkflowError::Forbidden(
            "you are not authorized to sign this request".into(),
        ));
    }
    if entry.signature(signer).is_some_and(|row| row.is_signed) {
        return Err(WorkflowError::AlreadySigned(signer.clone()));
    }
    let previous = entry.request.status;
    if !previous.accepts_signatures() {
        return Err(WorkflowError::InvalidState {
            action: "sign",
            status: previous,
        });
    }

    match entry.signature_mut(signer) {
        Some(row) => {
            row.is_signed = approve;
            row.signature_comment = comment;
            row.signed_at = now;
        }
        None => {
            let mut row = SignatureRecord::unsigned(request_id, signer.clone(), now);
            row.is_signed = approve;
            row.signature_comment = comment;
            entry.signatures.push(row);
        }
    }

    let valid = entry.signed_count();
    let request = &mut entry.request;
    request.valid_signatures = valid;
    if valid >= request.required_count() {
        request.status = RequestStatus::ReadyForAnchor;
    } else if !approve {
        request.status = RequestStatus::Rejected;
    }
    request.updated_at = now;
    Ok(previous)
}

/// Whether `caller` may delete the request in its current state.
pub fn check_deletable(entry: &RequestEntry, caller: &Identity) -> Result<(), WorkflowError> {
    if &entry.request.created_by != caller {
        return Err(WorkflowError::Forbidden(
            "you can only delete your own requests".into(),
        ));
    }
    if entry.request.status != RequestStatus::Pending {
        return Err(WorkflowError::InvalidState {
            action: "delete",
            status: entry.request.status,
        });
    }
    Ok(())
}

/// Lock the request for anchoring and append the optional attestation.
pub fn apply_anchor_request(
    entry: &mut RequestEntry,
    anchor: &AnchorRequest,
    caller: &Identity,
    now: Timestamp,
) -> Result<(), WorkflowError> {
    let request = &mut entry.request;
    if !request.status.is_anchor_eligible() {
        return Err(WorkflowError::InvalidState {
            action: "request anchoring of",
            status: request.status,
        });
    }
    if request.anchor_requested {
        return Err(WorkflowError::AlreadyRequested(request.id));
    }

    request.anchor_requested = true;
    request.anchor_batch_id = Some(anchor.batch_id.clone());
    request.anchor_diplome_label = Some(anchor.diplome_label.clone());
    request.anchor_requested_by = Some(caller.clone());
    request.updated_at = now;

    if let Some((signer, signature)) = anchor.attestation() {
        let message = anchor_message(&anchor.batch_id, &request.id);
        entry.attestations.push(AnchorAttestation {
            request_id: request.id,
            signer: signer.clone(),
            message,
            signature: signature.to_string(),
            created_at: now,
        });
    }
    Ok(())
}

/// Mark the request anchored. Succeeds once per request.
pub fn apply_anchor_confirmation(
    entry: &mut RequestEntry,
    tx_hash: &str,
    now: Timestamp,
) -> Result<RequestStatus, WorkflowError> {
    let request = &mut entry.request;
    if !request.anchor_requested {
        return Err(WorkflowError::AnchorNotRequested(request.id));
    }
    if request.status == RequestStatus::Anchored {
        return Err(WorkflowError::AlreadyAnchored(request.id));
    }
    let previous = request.status;
    request.status = RequestStatus::Anchored;
    request.anchor_tx_hash = Some(tx_hash.to_string());
    request.updated_at = now;
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diploma_types::{DiplomaRequest, RequestId, TemplateId};

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    fn entry(signers: &[&str]) -> RequestEntry {
        let rid = RequestId::generate();
        let required: Vec<Identity> = signers.iter().map(|s| id(s)).collect();
        let signatures = required
            .iter()
            .map(|s| SignatureRecord::unsigned(rid, s.clone(), Timestamp::new(1)))
            .collect();
        RequestEntry {
            request: DiplomaRequest {
                id: rid,
                diploma_id: TemplateId::generate(),
                created_by: id("registrar"),
                student_ids: vec!["s1".into()],
                comment: None,
                required_signatures: required,
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
            signatures,
            attestations: Vec::new(),
        }
    }

    fn anchor(batch: &str) -> AnchorRequest {
        AnchorRequest {
            batch_id: batch.into(),
            diplome_label: "Master 2024".into(),
            signer: None,
            signature: None,
        }
    }

    #[test]
    fn partial_approval_stays_pending() {
        let mut e = entry(&["a", "b"]);
        apply_signature(&mut e, &id("a"), true, None, Timestamp::new(5)).unwrap();
        assert_eq!(e.request.status, RequestStatus::Pending);
        assert_eq!(e.request.valid_signatures, 1);
        assert_eq!(e.request.updated_at, Timestamp::new(5));
    }

    #[test]
    fn last_approval_makes_ready() {
        let mut e = entry(&["a", "b"]);
        apply_signature(&mut e, &id("a"), true, None, Timestamp::new(5)).unwrap();
        let before = apply_signature(&mut e, &id("b"), true, None, Timestamp::new(6)).unwrap();
        assert_eq!(before, RequestStatus::Pending);
        assert_eq!(e.request.status, RequestStatus::ReadyForAnchor);
        assert_eq!(e.request.valid_signatures, 2);
    }

    #[test]
    fn first_decline_rejects() {
        let mut e = entry(&["a", "b", "c"]);
        apply_signature(&mut e, &id("a"), false, Some("typo".into()), Timestamp::new(5)).unwrap();
        assert_eq!(e.request.status, RequestStatus::Rejected);
        assert_eq!(e.request.valid_signatures, 0);
        let row = e.signature(&id("a")).unwrap();
        assert!(!row.is_signed);
        assert_eq!(row.signature_comment.as_deref(), Some("typo"));
    }

    #[test]
    fn outsider_is_forbidden_even_when_terminal() {
        let mut e = entry(&["a"]);
        e.request.status = RequestStatus::Anchored;
        let err = apply_signature(&mut e, &id("z"), true, None, Timestamp::new(5)).unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }

    #[test]
    fn already_signed_beats_invalid_state() {
        let mut e = entry(&["a"]);
        apply_signature(&mut e, &id("a"), true, None, Timestamp::new(5)).unwrap();
        assert_eq!(e.request.status, RequestStatus::ReadyForAnchor);
        let err = apply_signature(&mut e, &id("a"), true, None, Timestamp::new(6)).unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadySigned(_)));
    }

    #[test]
    fn declined_signer_on_rejected_request_is_invalid_state() {
        let mut e = entry(&["a", "b"]);
        apply_signature(&mut e, &id("a"), false, None, Timestamp::new(5)).unwrap();
        let err = apply_signature(&mut e, &id("b"), true, None, Timestamp::new(6)).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { action: "sign", .. }));
    }

    #[test]
    fn missing_row_is_upserted() {
        let mut e = entry(&["a", "b"]);
        e.signatures.clear();
        apply_signature(&mut e, &id("b"), true, None, Timestamp::new(5)).unwrap();
        assert_eq!(e.signatures.len(), 1);
        assert_eq!(e.request.valid_signatures, 1);
    }

    #[test]
    fn only_creator_deletes_pending() {
        let mut e = entry(&["a"]);
        assert_eq!(check_deletable(&e, &id("a")).unwrap_err().kind(), "forbidden");
        assert!(check_deletable(&e, &id("registrar")).is_ok());
        e.request.status = RequestStatus::Rejected;
        assert_eq!(
            check_deletable(&e, &id("registrar")).unwrap_err().kind(),
            "invalid_state"
        );
    }

    #[test]
    fn anchor_request_requires_eligible_status() {
        let mut e = entry(&["a"]);
        let err = apply_anchor_request(&mut e, &anchor("b1"), &id("x"), Timestamp::new(5))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_state");
        assert!(!e.request.anchor_requested);
    }

    #[test]
    fn legacy_approved_is_anchor_eligible() {
        let mut e = entry(&["a"]);
        e.request.status = RequestStatus::Approved;
        apply_anchor_request(&mut e, &anchor("b1"), &id("x"), Timestamp::new(5)).unwrap();
        assert!(e.request.anchor_requested);
        assert_eq!(e.request.anchor_requested_by, Some(id("x")));
    }

    #[test]
    fn anchor_request_appends_attestation() {
        let mut e = entry(&["a"]);
        e.request.status = RequestStatus::ReadyForAnchor;
        let mut req = anchor("b1");
        req.signer = Some(id("a"));
        req.signature = Some("0xsig".into());
        apply_anchor_request(&mut e, &req, &id("a"), Timestamp::new(5)).unwrap();
        assert_eq!(e.attestations.len(), 1);
        assert_eq!(
            e.attestations[0].message,
            format!("Anchor diploma batch b1 for request {}", e.request.id)
        );

        let err = apply_anchor_request(&mut e, &req, &id("a"), Timestamp::new(6)).unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyRequested(_)));
        assert_eq!(e.attestations.len(), 1);
    }

    #[test]
    fn confirmation_succeeds_once() {
        let mut e = entry(&["a"]);
        e.request.status = RequestStatus::ReadyForAnchor;
        assert!(matches!(
            apply_anchor_confirmation(&mut e, "0xtx", Timestamp::new(5)).unwrap_err(),
            WorkflowError::AnchorNotRequested(_)
        ));
        apply_anchor_request(&mut e, &anchor("b1"), &id("x"), Timestamp::new(6)).unwrap();
        apply_anchor_confirmation(&mut e, "0xtx", Timestamp::new(7)).unwrap();
        assert_eq!(e.request.status, RequestStatus::Anchored);
        assert_eq!(e.request.anchor_tx_hash.as_deref(), Some("0xtx"));
        assert!(matches!(
            apply_anchor_confirmation(&mut e, "0xother", Timestamp::new(8)).unwrap_err(),
            WorkflowError::AlreadyAnchored(_)
        ));
        assert_eq!(e.request.anchor_tx_hash.as_deref(), Some("0xtx"));
    }
}
