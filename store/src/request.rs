//! Request storage trait.
//!
//! A request, its signature rows and its attestations are read and written
//! together as a [`RequestEntry`]. Every mutating method is one atomic unit:
//! backends hold an exclusive write scope for the whole read-modify-write, so
//! concurrent signers on the same request serialize.

use crate::StoreError;
use diploma_types::{
    AnchorAttestation, DiplomaRequest, Identity, RequestId, RequestStatus, SignatureRecord,
};

/// A request together with its signature rows and attestations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestEntry {
    pub request: DiplomaRequest,
    /// At most one row per signer.
    pub signatures: Vec<SignatureRecord>,
    /// Append-only.
    pub attestations: Vec<AnchorAttestation>,
}

impl RequestEntry {
    pub fn signature(&self, signer: &Identity) -> Option<&SignatureRecord> {
        self.signatures.iter().find(|s| &s.signer == signer)
    }

    pub fn signature_mut(&mut self, signer: &Identity) -> Option<&mut SignatureRecord> {
        self.signatures.iter_mut().find(|s| &s.signer == signer)
    }

    /// Number of rows with `is_signed == true`.
    pub fn signed_count(&self) -> u32 {
        self.signatures.iter().filter(|s| s.is_signed).count() as u32
    }
}

/// Trait for request storage operations.
pub trait RequestStore: Send + Sync {
    /// Persist a new request with its initial signature rows.
    ///
    /// Fails with [`StoreError::Duplicate`] if the id is already taken.
    fn create_entry(&self, entry: &RequestEntry) -> Result<(), StoreError>;

    fn get_request(&self, id: &RequestId) -> Result<DiplomaRequest, StoreError>;

    fn get_entry(&self, id: &RequestId) -> Result<RequestEntry, StoreError>;

    fn iter_requests(&self) -> Result<Vec<DiplomaRequest>, StoreError>;

    fn get_signatures(&self, id: &RequestId) -> Result<Vec<SignatureRecord>, StoreError>;

    /// Every request with its rows. Backends should read from one snapshot.
    fn iter_entries(&self) -> Result<Vec<RequestEntry>, StoreError> {
        let mut entries = Vec::new();
        for request in self.iter_requests()? {
            match self.get_entry(&request.id) {
                Ok(entry) => entries.push(entry),
                // Deleted since the listing was taken.
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(entries)
    }

    /// Load the entry, run `apply` on it and persist the result, all inside
    /// one exclusive write scope.
    ///
    /// If `apply` returns `Err` nothing is written. On success the request row
    /// is overwritten, signature rows are upserted by `(request, signer)` and
    /// attestations beyond those loaded are appended; existing attestations
    /// are never rewritten. A missing request surfaces as
    /// `E::from(StoreError::NotFound(..))`.
    fn update_entry<T, E, F>(&self, id: &RequestId, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut RequestEntry) -> Result<T, E>,
        E: From<StoreError>;

    /// Delete the request, its signature rows and attestations if `guard`
    /// accepts the current entry. Atomic; returns the removed entry.
    fn delete_entry<E, F>(&self, id: &RequestId, guard: F) -> Result<RequestEntry, E>
    where
        F: FnOnce(&RequestEntry) -> Result<(), E>,
        E: From<StoreError>;

    fn request_count(&self) -> Result<u64, StoreError> {
        self.iter_requests().map(|v| v.len() as u64)
    }

    fn count_by_status(&self, status: RequestStatus) -> Result<u64, StoreError> {
        self.iter_by_status(status).map(|v| v.len() as u64)
    }

    fn iter_by_status(&self, status: RequestStatus) -> Result<Vec<DiplomaRequest>, StoreError> {
        Ok(self
            .iter_requests()?
            .into_iter()
            .filter(|r| r.status == status)
            .collect())
    }
}
