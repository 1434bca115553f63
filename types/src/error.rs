//! Validation errors raised while constructing core types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("identity must not be empty")]
    EmptyIdentity,

    #[error("identity is {len} bytes, at most {max} allowed")]
    IdentityTooLong { len: usize, max: usize },

    #[error("unknown identity scheme: {0}")]
    UnknownScheme(String),

    #[error("unknown request status: {0}")]
    UnknownStatus(String),
}
