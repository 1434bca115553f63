//! Nullable auth service: canned identities, no network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use diploma_identity::{IdentityError, IdentityResolver, ResolvedIdentity, WalletDirectory};

/// Resolves tokens from a fixed table.
///
/// Unknown tokens are `Unauthenticated`. [`set_unavailable`] makes every
/// call fail as if the auth service were down.
///
/// [`set_unavailable`]: NullIdentityResolver::set_unavailable
#[derive(Default)]
pub struct NullIdentityResolver {
    tokens: Mutex<HashMap<String, ResolvedIdentity>>,
    unavailable: AtomicBool,
}

impl NullIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token whose bearer has the given wallet address and user id.
    pub fn with_user(self, token: &str, user_id: &str, wallet: &str) -> Self {
        self.add(
            token,
            ResolvedIdentity {
                user_id: Some(user_id.to_string()),
                wallet_address: Some(wallet.to_string()),
            },
        );
        self
    }

    pub fn add(&self, token: &str, identity: ResolvedIdentity) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), identity);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityResolver for NullIdentityResolver {
    async fn resolve_identity(&self, token: &str) -> Result<ResolvedIdentity, IdentityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IdentityError::UpstreamUnavailable("null resolver offline".into()));
        }
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Unauthenticated("unknown token".into()))
    }
}

/// Wallet directory backed by a fixed table.
#[derive(Default)]
pub struct NullWalletDirectory {
    wallets: Mutex<HashMap<String, String>>,
}

impl NullWalletDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(self, user_id: &str, wallet: &str) -> Self {
        self.wallets
            .lock()
            .unwrap()
            .insert(user_id.to_string(), wallet.to_string());
        self
    }
}

#[async_trait]
impl WalletDirectory for NullWalletDirectory {
    async fn resolve_wallet(&self, user_id: &str) -> Result<String, IdentityError> {
        self.wallets
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownUser(user_id.to_string()))
    }
}
