//! Caller identity for the diploma approval service.
//!
//! Authentication itself lives in an external auth service; this crate turns
//! an opaque bearer token into a canonical [`diploma_types::Identity`] and
//! maps signer references to the same scheme before they reach the workflow.

pub mod client;
pub mod error;
pub mod gateway;
pub mod resolver;

pub use client::HttpIdentityClient;
pub use error::IdentityError;
pub use gateway::IdentityGateway;
pub use resolver::{IdentityResolver, ResolvedIdentity, WalletDirectory};
