use diploma_store::StoreError;
use diploma_types::{Identity, RequestId, RequestStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("cannot {action} a request in status {status}")]
    InvalidState {
        action: &'static str,
        status: RequestStatus,
    },

    #[error("anchoring was not requested for request {0}")]
    AnchorNotRequested(RequestId),

    #[error("{0} has already signed this request")]
    AlreadySigned(Identity),

    #[error("anchoring already requested for request {0}")]
    AlreadyRequested(RequestId),

    #[error("request {0} is already anchored")]
    AlreadyAnchored(RequestId),

    #[error("{0}")]
    BadRequest(String),

    #[error("storage error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Stable machine-readable code for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidState { .. } | Self::AnchorNotRequested(_) => "invalid_state",
            Self::AlreadySigned(_) | Self::AlreadyRequested(_) | Self::AlreadyAnchored(_) => {
                "already_acted"
            }
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => WorkflowError::NotFound(what),
            other => WorkflowError::Internal(other.to_string()),
        }
    }
}
