//! Caller credentials.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::RpcError;

/// The bearer token from `Authorization`, forwarded to the auth service.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, RpcError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| RpcError::Unauthenticated("no authentication token provided".into()))?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();
    if token.is_empty() {
        return Err(RpcError::Unauthenticated(
            "no authentication token provided".into(),
        ));
    }
    Ok(token)
}

/// Check the internal service credential via `x-api-key` or
/// `Authorization: Bearer`.
///
/// Without a configured credential every call is refused.
pub fn authorize_internal(headers: &HeaderMap, expected: Option<&str>) -> Result<(), RpcError> {
    let expected = match expected {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => {
            return Err(RpcError::Forbidden(
                "internal callback is not enabled".into(),
            ))
        }
    };

    if let Some(value) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        if constant_time_eq(value, expected) {
            return Ok(());
        }
    }
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            if constant_time_eq(token, expected) {
                return Ok(());
            }
        }
    }
    Err(RpcError::Unauthenticated("invalid internal credential".into()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
