//! Lifecycle status of a diploma request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// The status of a diploma request.
///
/// `Pending → ReadyForAnchor → Anchored`, with `Rejected` reachable only from
/// `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Collecting signatures.
    Pending,
    /// All signatures collected. Written by earlier deployments only; new
    /// approvals go straight to `ReadyForAnchor`.
    Approved,
    /// All signatures collected; may be locked for anchoring.
    ReadyForAnchor,
    /// Anchoring confirmed with a transaction hash.
    Anchored,
    /// A required signer declined.
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        Self::Pending,
        Self::Approved,
        Self::ReadyForAnchor,
        Self::Anchored,
        Self::Rejected,
    ];

    /// Whether signers may still act on the request.
    pub fn accepts_signatures(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the request may be locked for anchoring.
    pub fn is_anchor_eligible(&self) -> bool {
        matches!(self, Self::Approved | Self::ReadyForAnchor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::ReadyForAnchor => "ready_for_anchor",
            Self::Anchored => "anchored",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypesError::UnknownStatus(s.to_string()))
    }
}
