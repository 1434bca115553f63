//! Collaborator traits for the external auth service.

use async_trait::async_trait;

use crate::IdentityError;

/// What the auth service knows about the bearer of a token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub user_id: Option<String>,
    pub wallet_address: Option<String>,
}

/// Resolves an opaque bearer token to the caller's identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(&self, token: &str) -> Result<ResolvedIdentity, IdentityError>;
}

/// Maps a user id to the wallet address registered for it.
#[async_trait]
pub trait WalletDirectory: Send + Sync {
    async fn resolve_wallet(&self, user_id: &str) -> Result<String, IdentityError>;
}
