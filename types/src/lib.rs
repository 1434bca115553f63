//! Fundamental types for the diploma approval service.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identifiers, caller identities, timestamps and clocks, request status, and the
//! persisted data model (templates, requests, signature rows, attestations).

pub mod error;
pub mod ids;
pub mod identity;
pub mod request;
pub mod status;
pub mod template;
pub mod time;

pub use error::TypesError;
pub use identity::{Identity, IdentityScheme};
pub use ids::{RequestId, TemplateId};
pub use request::{anchor_message, AnchorAttestation, DiplomaRequest, SignatureRecord};
pub use status::RequestStatus;
pub use template::DiplomaTemplate;
pub use time::{Clock, SystemClock, Timestamp};
