//! LMDB storage backend for the diploma approval service.
//!
//! Implements the storage traits from `diploma-store` using the `heed` LMDB
//! bindings. Each logical table maps to one LMDB database within a single
//! environment. LMDB allows a single writer at a time, so every write
//! transaction is a serializable unit of work.

pub mod environment;
pub mod error;
mod keys;
pub mod request;
pub mod template;

pub use environment::LmdbStore;
pub use error::LmdbError;
