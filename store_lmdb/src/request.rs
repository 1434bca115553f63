//! LMDB implementation of RequestStore.
//!
//! Each mutating call runs inside exactly one write transaction. LMDB admits
//! a single writer per environment, so two signers racing on the same
//! request are applied one after the other and the second sees the first's
//! signature row.

use heed::RoTxn;

use diploma_store::{RequestEntry, RequestStore, StoreError};
use diploma_types::{AnchorAttestation, DiplomaRequest, RequestId, SignatureRecord};

use crate::keys::{attestation_key, signature_key};
use crate::{LmdbError, LmdbStore};

fn lift<E: From<StoreError>, X: Into<LmdbError>>(e: X) -> E {
    E::from(StoreError::from(e.into()))
}

impl LmdbStore {
    fn load_request(
        &self,
        txn: &RoTxn,
        id: &RequestId,
    ) -> Result<Option<DiplomaRequest>, LmdbError> {
        match self.requests_db.get(txn, id.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    fn load_signatures(
        &self,
        txn: &RoTxn,
        request: &DiplomaRequest,
    ) -> Result<Vec<SignatureRecord>, LmdbError> {
        let mut rows: Vec<SignatureRecord> = Vec::new();
        for item in self.signatures_db.prefix_iter(txn, request.id.as_bytes())? {
            let (_, bytes) = item?;
            rows.push(bincode::deserialize(bytes)?);
        }
        // Keys sort by signer; present rows in the order signers were listed.
        rows.sort_by_key(|row| {
            request
                .required_signatures
                .iter()
                .position(|s| s == &row.signer)
                .unwrap_or(usize::MAX)
        });
        Ok(rows)
    }

    fn load_attestations(
        &self,
        txn: &RoTxn,
        id: &RequestId,
    ) -> Result<Vec<AnchorAttestation>, LmdbError> {
        let mut rows = Vec::new();
        for item in self.attestations_db.prefix_iter(txn, id.as_bytes())? {
            let (_, bytes) = item?;
            rows.push(bincode::deserialize(bytes)?);
        }
        Ok(rows)
    }

    fn load_entry(&self, txn: &RoTxn, id: &RequestId) -> Result<RequestEntry, LmdbError> {
        let request = self
            .load_request(txn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("request {id}")))?;
        let signatures = self.load_signatures(txn, &request)?;
        let attestations = self.load_attestations(txn, id)?;
        Ok(RequestEntry {
            request,
            signatures,
            attestations,
        })
    }

    /// Keys of every row under `id` in `db`, collected so the cursor is
    /// released before the caller deletes them.
    fn keys_with_prefix(
        &self,
        txn: &RoTxn,
        db: &crate::environment::Table,
        id: &RequestId,
    ) -> Result<Vec<Vec<u8>>, LmdbError> {
        let mut keys = Vec::new();
        for item in db.prefix_iter(txn, id.as_bytes())? {
            let (key, _) = item?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    /// Write the request row, upsert every signature row and append the
    /// attestations from `first_new_attestation` onwards.
    fn write_entry(
        &self,
        wtxn: &mut heed::RwTxn,
        entry: &RequestEntry,
        first_new_attestation: usize,
    ) -> Result<(), LmdbError> {
        let id = &entry.request.id;
        let bytes = bincode::serialize(&entry.request)?;
        self.requests_db.put(wtxn, id.as_bytes(), &bytes)?;

        for row in &entry.signatures {
            let bytes = bincode::serialize(row)?;
            self.signatures_db
                .put(wtxn, &signature_key(id, &row.signer), &bytes)?;
        }

        for (index, attestation) in entry
            .attestations
            .iter()
            .enumerate()
            .skip(first_new_attestation)
        {
            let index = u32::try_from(index)
                .map_err(|_| LmdbError::Serialization("attestation index overflow".into()))?;
            let bytes = bincode::serialize(attestation)?;
            self.attestations_db
                .put(wtxn, &attestation_key(id, index), &bytes)?;
        }
        Ok(())
    }
}

impl RequestStore for LmdbStore {
    fn create_entry(&self, entry: &RequestEntry) -> Result<(), StoreError> {
        let id = &entry.request.id;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self.load_request(&wtxn, id)?.is_some() {
            return Err(LmdbError::Duplicate(format!("request {id}")).into());
        }
        self.write_entry(&mut wtxn, entry, 0)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(request = %id, signers = entry.signatures.len(), "stored request");
        Ok(())
    }

    fn get_request(&self, id: &RequestId) -> Result<DiplomaRequest, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let request = self
            .load_request(&rtxn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("request {id}")))?;
        Ok(request)
    }

    fn get_entry(&self, id: &RequestId) -> Result<RequestEntry, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load_entry(&rtxn, id)?)
    }

    fn iter_requests(&self) -> Result<Vec<DiplomaRequest>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut requests = Vec::new();
        for item in self.requests_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, bytes) = item.map_err(LmdbError::from)?;
            requests.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(requests)
    }

    fn get_signatures(&self, id: &RequestId) -> Result<Vec<SignatureRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let request = self
            .load_request(&rtxn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("request {id}")))?;
        Ok(self.load_signatures(&rtxn, &request)?)
    }

    fn iter_entries(&self) -> Result<Vec<RequestEntry>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        for item in self.requests_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, _) = item.map_err(LmdbError::from)?;
            let bytes: [u8; 16] = key
                .try_into()
                .map_err(|_| LmdbError::Serialization("request key is not 16 bytes".into()))?;
            ids.push(RequestId::from_bytes(bytes));
        }
        let mut entries = Vec::with_capacity(ids.len());
        for id in &ids {
            entries.push(self.load_entry(&rtxn, id)?);
        }
        Ok(entries)
    }

    fn update_entry<T, E, F>(&self, id: &RequestId, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut RequestEntry) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut wtxn = self.env.write_txn().map_err(lift::<E, _>)?;
        let mut entry = self.load_entry(&wtxn, id).map_err(lift::<E, _>)?;
        let loaded_attestations = entry.attestations.len();

        // On Err the transaction is dropped, which aborts it.
        let out = apply(&mut entry)?;

        self.write_entry(&mut wtxn, &entry, loaded_attestations)
            .map_err(lift::<E, _>)?;
        wtxn.commit().map_err(lift::<E, _>)?;
        Ok(out)
    }

    fn delete_entry<E, F>(&self, id: &RequestId, guard: F) -> Result<RequestEntry, E>
    where
        F: FnOnce(&RequestEntry) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut wtxn = self.env.write_txn().map_err(lift::<E, _>)?;
        let entry = self.load_entry(&wtxn, id).map_err(lift::<E, _>)?;
        guard(&entry)?;

        let signature_keys = self
            .keys_with_prefix(&wtxn, &self.signatures_db, id)
            .map_err(lift::<E, _>)?;
        let attestation_keys = self
            .keys_with_prefix(&wtxn, &self.attestations_db, id)
            .map_err(lift::<E, _>)?;
        for key in &signature_keys {
            self.signatures_db
                .delete(&mut wtxn, key)
                .map_err(lift::<E, _>)?;
        }
        for key in &attestation_keys {
            self.attestations_db
                .delete(&mut wtxn, key)
                .map_err(lift::<E, _>)?;
        }
        self.requests_db
            .delete(&mut wtxn, id.as_bytes())
            .map_err(lift::<E, _>)?;
        wtxn.commit().map_err(lift::<E, _>)?;

        tracing::debug!(
            request = %id,
            signatures = signature_keys.len(),
            attestations = attestation_keys.len(),
            "deleted request"
        );
        Ok(entry)
    }

    fn request_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.requests_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
