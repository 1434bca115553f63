//! HTTP client for the external auth service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::resolver::{IdentityResolver, ResolvedIdentity, WalletDirectory};
use crate::IdentityError;

/// Default timeout for auth service requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the auth service.
///
/// `GET {base}/auth/profile` resolves a bearer token, and
/// `GET {base}/users/{id}/wallet` looks up a user's wallet address.
pub struct HttpIdentityClient {
    base_url: String,
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
}

impl HttpIdentityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/users/{user_id}/wallet`, with `user_id` encoded as a single
    /// path segment.
    fn wallet_url(&self, user_id: &str) -> Result<reqwest::Url, IdentityError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            IdentityError::UpstreamUnavailable(format!("invalid auth service url: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                IdentityError::UpstreamUnavailable("auth service url cannot be a base".into())
            })?
            .pop_if_empty()
            .extend(["users", user_id, "wallet"]);
        Ok(url)
    }
}

fn transport_error(e: reqwest::Error) -> IdentityError {
    if e.is_timeout() {
        tracing::warn!(error = %e, "auth service request timed out");
        IdentityError::UpstreamUnavailable("request timed out".into())
    } else if e.is_connect() {
        tracing::warn!(error = %e, "auth service connection failed");
        IdentityError::UpstreamUnavailable("connection failed".into())
    } else {
        tracing::warn!(error = %e, "auth service request failed");
        IdentityError::UpstreamUnavailable("request failed".into())
    }
}

/// First of `keys` present in `body` as a non-empty string or a number.
fn string_field(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match body.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[async_trait]
impl IdentityResolver for HttpIdentityClient {
    async fn resolve_identity(&self, token: &str) -> Result<ResolvedIdentity, IdentityError> {
        let url = format!("{}/auth/profile", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            tracing::warn!(%status, "auth service returned a server error");
            return Err(IdentityError::UpstreamUnavailable(format!(
                "auth service responded with {status}"
            )));
        }
        if !status.is_success() {
            return Err(IdentityError::Unauthenticated(format!(
                "auth service responded with {status}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "unparseable profile response");
            IdentityError::UpstreamUnavailable("invalid profile response".into())
        })?;

        let resolved = ResolvedIdentity {
            user_id: string_field(&body, &["id", "userId", "sub"]),
            wallet_address: string_field(&body, &["address", "walletAddress"]),
        };
        if resolved.user_id.is_none() && resolved.wallet_address.is_none() {
            return Err(IdentityError::Unauthenticated(
                "profile carries no identity".into(),
            ));
        }
        Ok(resolved)
    }
}

#[async_trait]
impl WalletDirectory for HttpIdentityClient {
    async fn resolve_wallet(&self, user_id: &str) -> Result<String, IdentityError> {
        let url = self.wallet_url(user_id)?;
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(IdentityError::UnknownUser(user_id.to_string())),
            status if !status.is_success() => {
                tracing::warn!(%status, user_id, "wallet lookup failed");
                return Err(IdentityError::UpstreamUnavailable(format!(
                    "wallet directory responded with {status}"
                )));
            }
            _ => {}
        }

        let body: Value = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "unparseable wallet response");
            IdentityError::UpstreamUnavailable("invalid wallet response".into())
        })?;
        string_field(&body, &["walletAddress", "address"])
            .ok_or_else(|| IdentityError::UnknownUser(user_id.to_string()))
    }
}
