//! Diploma request approval and anchoring workflow.
//!
//! A request names a fixed set of required signers. Every signer approves or
//! declines once; when all have approved the request becomes ready for
//! anchoring, and the first decline rejects it. Anchoring is a two step
//! side-track: a caller locks the request for a batch, then the external
//! anchoring process confirms it with a transaction hash.
//!
//! All mutations of one request go through a single store unit of work, so
//! the signature count and status never diverge under concurrent signers.

pub mod anchor;
pub mod error;
pub mod event;
pub mod machine;
pub mod requests;
pub mod templates;
pub mod workflow;

pub use anchor::{AnchorPayload, AnchorRequest};
pub use error::WorkflowError;
pub use event::{EventBus, WorkflowEvent};
pub use requests::NewRequest;
pub use templates::NewTemplate;
pub use workflow::DiplomaWorkflow;
