//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! All external dependencies (clock, storage, the auth service) are abstracted
//! behind traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod identity;
pub mod store;

pub use clock::NullClock;
pub use identity::{NullIdentityResolver, NullWalletDirectory};
pub use store::NullStore;
