use std::sync::Arc;
use std::thread;

use diploma_store::{RequestEntry, RequestStore, StoreError, TemplateStore};
use diploma_store_lmdb::LmdbStore;
use diploma_types::{
    AnchorAttestation, DiplomaRequest, DiplomaTemplate, Identity, RequestId, RequestStatus,
    SignatureRecord, TemplateId, Timestamp,
};

const MAP_SIZE: usize = 32 * 1024 * 1024;

fn open() -> (tempfile::TempDir, LmdbStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LmdbStore::open(dir.path(), MAP_SIZE).unwrap();
    (dir, store)
}

fn id(name: &str) -> Identity {
    Identity::new(name).unwrap()
}

fn template() -> DiplomaTemplate {
    DiplomaTemplate {
        id: TemplateId::generate(),
        name: "Master Informatique".into(),
        description: None,
        level: "Master".into(),
        field: "Informatique".into(),
        is_active: true,
        created_at: Timestamp::new(10),
        updated_at: Timestamp::new(10),
    }
}

fn entry(signers: &[&str]) -> RequestEntry {
    let request = DiplomaRequest {
        id: RequestId::generate(),
        diploma_id: TemplateId::generate(),
        created_by: id("registrar"),
        student_ids: vec!["s-1".into(), "s-2".into()],
        comment: Some("promo 2024".into()),
        required_signatures: signers.iter().map(|s| id(s)).collect(),
        status: RequestStatus::Pending,
        valid_signatures: 0,
        anchor_requested: false,
        anchor_batch_id: None,
        anchor_diplome_label: None,
        anchor_requested_by: None,
        anchor_tx_hash: None,
        created_at: Timestamp::new(100),
        updated_at: Timestamp::new(100),
    };
    let signatures = request
        .required_signatures
        .iter()
        .map(|s| SignatureRecord::unsigned(request.id, s.clone(), Timestamp::new(100)))
        .collect();
    RequestEntry {
        request,
        signatures,
        attestations: Vec::new(),
    }
}

fn attestation(request: RequestId, signer: &str, n: u32) -> AnchorAttestation {
    AnchorAttestation {
        request_id: request,
        signer: id(signer),
        message: format!("message {n}"),
        signature: format!("0xsig{n}"),
        created_at: Timestamp::new(200 + n as u64),
    }
}

#[test]
fn template_roundtrip() {
    let (_dir, store) = open();
    let t = template();
    assert!(!store.template_exists(&t.id).unwrap());
    store.put_template(&t).unwrap();
    assert!(store.template_exists(&t.id).unwrap());
    assert_eq!(store.get_template(&t.id).unwrap(), t);
    assert_eq!(store.template_count().unwrap(), 1);
    assert_eq!(store.iter_templates().unwrap(), vec![t]);
}

#[test]
fn missing_template_is_not_found() {
    let (_dir, store) = open();
    let err = store.get_template(&TemplateId::generate()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn create_and_read_entry() {
    let (_dir, store) = open();
    let e = entry(&["carol", "bob", "alice"]);
    store.create_entry(&e).unwrap();

    let loaded = store.get_entry(&e.request.id).unwrap();
    assert_eq!(loaded, e);
    // Rows come back in the order signers were listed, not key order.
    let signers: Vec<_> = loaded.signatures.iter().map(|s| s.signer.as_str()).collect();
    assert_eq!(signers, vec!["carol", "bob", "alice"]);
    assert_eq!(store.request_count().unwrap(), 1);
}

#[test]
fn duplicate_create_is_rejected() {
    let (_dir, store) = open();
    let e = entry(&["alice"]);
    store.create_entry(&e).unwrap();
    let err = store.create_entry(&e).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[test]
fn update_upserts_signatures() {
    let (_dir, store) = open();
    let e = entry(&["alice", "bob"]);
    let rid = e.request.id;
    store.create_entry(&e).unwrap();

    store
        .update_entry::<_, StoreError, _>(&rid, |entry| {
            let row = entry.signature_mut(&id("alice")).unwrap();
            row.is_signed = true;
            row.signature_comment = Some("ok".into());
            entry.request.valid_signatures = entry.signed_count();
            Ok(())
        })
        .unwrap();

    let loaded = store.get_entry(&rid).unwrap();
    assert_eq!(loaded.signatures.len(), 2);
    assert_eq!(loaded.request.valid_signatures, 1);
    let alice = loaded.signature(&id("alice")).unwrap();
    assert!(alice.is_signed);
    assert_eq!(alice.signature_comment.as_deref(), Some("ok"));
}

#[test]
fn failed_update_writes_nothing() {
    let (_dir, store) = open();
    let e = entry(&["alice"]);
    let rid = e.request.id;
    store.create_entry(&e).unwrap();

    let result = store.update_entry::<(), _, _>(&rid, |entry| {
        entry.request.status = RequestStatus::Rejected;
        Err(StoreError::Backend("abort".into()))
    });
    assert!(result.is_err());
    assert_eq!(
        store.get_request(&rid).unwrap().status,
        RequestStatus::Pending
    );
}

#[test]
fn update_of_missing_request_is_not_found() {
    let (_dir, store) = open();
    let err = store
        .update_entry::<(), StoreError, _>(&RequestId::generate(), |_| Ok(()))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn attestations_append_in_order() {
    let (_dir, store) = open();
    let e = entry(&["alice"]);
    let rid = e.request.id;
    store.create_entry(&e).unwrap();

    for n in 0..3 {
        store
            .update_entry::<_, StoreError, _>(&rid, |entry| {
                entry.attestations.push(attestation(rid, "alice", n));
                Ok(())
            })
            .unwrap();
    }

    let loaded = store.get_entry(&rid).unwrap();
    let messages: Vec<_> = loaded.attestations.iter().map(|a| a.message.as_str()).collect();
    assert_eq!(messages, vec!["message 0", "message 1", "message 2"]);
}

#[test]
fn delete_removes_every_row() {
    let (_dir, store) = open();
    let e = entry(&["alice", "bob"]);
    let rid = e.request.id;
    let keep = entry(&["alice"]);
    store.create_entry(&e).unwrap();
    store.create_entry(&keep).unwrap();
    store
        .update_entry::<_, StoreError, _>(&rid, |entry| {
            entry.attestations.push(attestation(rid, "alice", 0));
            Ok(())
        })
        .unwrap();

    let removed = store
        .delete_entry::<StoreError, _>(&rid, |_| Ok(()))
        .unwrap();
    assert_eq!(removed.request.id, rid);
    assert_eq!(removed.attestations.len(), 1);

    assert!(matches!(
        store.get_entry(&rid).unwrap_err(),
        StoreError::NotFound(_)
    ));
    assert_eq!(store.request_count().unwrap(), 1);
    // The other request's rows are untouched.
    assert_eq!(store.get_signatures(&keep.request.id).unwrap().len(), 1);

    // Recreating under the same id starts from a clean slate.
    store.create_entry(&e).unwrap();
    assert!(store.get_entry(&rid).unwrap().attestations.is_empty());
}

#[test]
fn rejected_guard_keeps_the_request() {
    let (_dir, store) = open();
    let e = entry(&["alice"]);
    let rid = e.request.id;
    store.create_entry(&e).unwrap();

    let result = store.delete_entry(&rid, |_| Err(StoreError::Backend("no".into())));
    assert!(result.is_err());
    assert!(store.get_entry(&rid).is_ok());
}

#[test]
fn count_by_status() {
    let (_dir, store) = open();
    let a = entry(&["alice"]);
    let mut b = entry(&["alice"]);
    b.request.status = RequestStatus::Anchored;
    store.create_entry(&a).unwrap();
    store.create_entry(&b).unwrap();

    assert_eq!(store.count_by_status(RequestStatus::Pending).unwrap(), 1);
    assert_eq!(store.count_by_status(RequestStatus::Anchored).unwrap(), 1);
    assert_eq!(store.count_by_status(RequestStatus::Rejected).unwrap(), 0);
}

#[test]
fn iter_entries_returns_every_request_with_rows() {
    let (_dir, store) = open();
    let mut a = entry(&["alice", "bob"]);
    a.attestations.push(attestation(a.request.id, "alice", 0));
    let b = entry(&["carol"]);
    store.create_entry(&a).unwrap();
    store.create_entry(&b).unwrap();

    let mut entries = store.iter_entries().unwrap();
    entries.sort_by_key(|e| e.request.required_signatures.len());
    assert_eq!(entries, vec![b, a]);
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let e = entry(&["alice"]);
    let t = template();
    {
        let store = LmdbStore::open(dir.path(), MAP_SIZE).unwrap();
        store.put_template(&t).unwrap();
        store.create_entry(&e).unwrap();
        store.sync().unwrap();
    }
    let store = LmdbStore::open(dir.path(), MAP_SIZE).unwrap();
    assert_eq!(store.get_template(&t.id).unwrap(), t);
    assert_eq!(store.get_entry(&e.request.id).unwrap(), e);
}

#[test]
fn concurrent_updates_on_one_request_serialize() {
    let (_dir, store) = open();
    let signers: Vec<String> = (0..8).map(|n| format!("signer-{n}")).collect();
    let refs: Vec<&str> = signers.iter().map(String::as_str).collect();
    let e = entry(&refs);
    let rid = e.request.id;
    store.create_entry(&e).unwrap();

    let store = Arc::new(store);
    let handles: Vec<_> = signers
        .iter()
        .cloned()
        .map(|signer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .update_entry::<_, StoreError, _>(&rid, |entry| {
                        entry.signature_mut(&id(&signer)).unwrap().is_signed = true;
                        entry.request.valid_signatures = entry.signed_count();
                        Ok(())
                    })
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let loaded = store.get_entry(&rid).unwrap();
    assert_eq!(loaded.request.valid_signatures, 8);
    assert_eq!(loaded.signed_count(), 8);
}
