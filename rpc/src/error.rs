//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use diploma_identity::IdentityError;
use diploma_kpi::KpiError;
use diploma_workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Kpi(#[from] KpiError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    /// Stable machine-readable code returned as `error` in the body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workflow(e) => e.kind(),
            Self::Identity(IdentityError::Unauthenticated(_)) => "unauthenticated",
            Self::Identity(IdentityError::UpstreamUnavailable(_)) => "upstream_unavailable",
            Self::Identity(IdentityError::UnknownUser(_) | IdentityError::BadRequest(_)) => {
                "bad_request"
            }
            Self::Kpi(_) | Self::Server(_) => "internal",
            Self::InvalidRequest(_) => "bad_request",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            "not_found" => StatusCode::NOT_FOUND,
            "forbidden" => StatusCode::FORBIDDEN,
            "invalid_state" | "already_acted" => StatusCode::CONFLICT,
            "unauthenticated" => StatusCode::UNAUTHORIZED,
            "upstream_unavailable" => StatusCode::BAD_GATEWAY,
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = self.status();
        // Storage and upstream detail stays in the logs.
        let message = match kind {
            "internal" => {
                tracing::error!(error = %self, "request failed");
                "internal server error".to_string()
            }
            "upstream_unavailable" => {
                tracing::warn!(error = %self, "identity service unavailable");
                "unable to verify user authentication".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
