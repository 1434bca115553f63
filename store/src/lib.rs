//! Abstract storage traits for the diploma approval service.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod request;
pub mod template;

pub use error::StoreError;
pub use request::{RequestEntry, RequestStore};
pub use template::TemplateStore;

/// Everything the workflow needs from a backend.
pub trait DiplomaStore: TemplateStore + RequestStore {}

impl<T: TemplateStore + RequestStore> DiplomaStore for T {}
