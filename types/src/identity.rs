//! Caller and signer identities.
//!
//! Every deployment picks exactly one [`IdentityScheme`]. Creators, required
//! signers, signature rows and attestation signers are all stored in that
//! scheme; external representations are converted at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Which representation is canonical for identities in this deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScheme {
    /// `0x`-prefixed wallet addresses (lowercased).
    #[default]
    Wallet,
    /// Opaque user ids issued by the auth service.
    UserId,
}

impl IdentityScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::UserId => "user_id",
        }
    }
}

impl FromStr for IdentityScheme {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wallet" | "wallet_address" => Ok(Self::Wallet),
            "user_id" | "userid" | "user" => Ok(Self::UserId),
            other => Err(TypesError::UnknownScheme(other.to_string())),
        }
    }
}

/// A canonical identity (wallet address or user id, depending on the scheme).
///
/// Wallet addresses compare case-insensitively on chain, so they are
/// lowercased on construction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    /// Length of a `0x`-prefixed 20-byte hex address.
    pub const WALLET_ADDRESS_LEN: usize = 42;

    /// Longest accepted identity in bytes. Signature rows are keyed by
    /// request id plus signer, and LMDB keys are capped at 511 bytes.
    pub const MAX_LEN: usize = 256;

    pub fn new(raw: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyIdentity);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(TypesError::IdentityTooLong {
                len: trimmed.len(),
                max: Self::MAX_LEN,
            });
        }
        if Self::looks_like_wallet(trimmed) {
            Ok(Self(trimmed.to_lowercase()))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Whether `s` has the shape of a `0x` + 40 hex digit address.
    pub fn looks_like_wallet(s: &str) -> bool {
        s.len() == Self::WALLET_ADDRESS_LEN
            && (s.starts_with("0x") || s.starts_with("0X"))
            && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn is_wallet_address(&self) -> bool {
        Self::looks_like_wallet(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
