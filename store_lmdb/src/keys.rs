//! Binary key layouts.
//!
//! Request and template ids are 16 raw bytes, so every per-request table can
//! be prefix-scanned with the id alone.

use diploma_types::{Identity, RequestId};

/// `request_id ++ signer`
pub(crate) fn signature_key(request: &RequestId, signer: &Identity) -> Vec<u8> {
    let signer = signer.as_str().as_bytes();
    let mut key = Vec::with_capacity(16 + signer.len());
    key.extend_from_slice(request.as_bytes());
    key.extend_from_slice(signer);
    key
}

/// `request_id ++ index (u32 big-endian)`, so attestations scan in append order.
pub(crate) fn attestation_key(request: &RequestId, index: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(20);
    key.extend_from_slice(request.as_bytes());
    key.extend_from_slice(&index.to_be_bytes());
    key
}
