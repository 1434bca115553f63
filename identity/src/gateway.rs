//! Boundary mapping from external identities to the canonical scheme.

use std::sync::Arc;

use diploma_types::{Identity, IdentityScheme};

use crate::resolver::{IdentityResolver, WalletDirectory};
use crate::IdentityError;

/// Resolves callers and signer references into the deployment's
/// [`IdentityScheme`].
///
/// Under [`IdentityScheme::Wallet`] a caller is identified by the wallet
/// address on their profile, and a signer reference that is not already an
/// address is looked up in the wallet directory. Under
/// [`IdentityScheme::UserId`] both are taken as user ids.
#[derive(Clone)]
pub struct IdentityGateway {
    resolver: Arc<dyn IdentityResolver>,
    directory: Arc<dyn WalletDirectory>,
    scheme: IdentityScheme,
}

impl IdentityGateway {
    pub fn new(
        resolver: Arc<dyn IdentityResolver>,
        directory: Arc<dyn WalletDirectory>,
        scheme: IdentityScheme,
    ) -> Self {
        Self {
            resolver,
            directory,
            scheme,
        }
    }

    pub fn scheme(&self) -> IdentityScheme {
        self.scheme
    }

    /// Identify the bearer of `token`.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, IdentityError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::Unauthenticated("missing bearer token".into()));
        }
        let resolved = self.resolver.resolve_identity(token).await?;
        let raw = match self.scheme {
            IdentityScheme::Wallet => resolved.wallet_address.ok_or_else(|| {
                IdentityError::Unauthenticated("no wallet address found in profile".into())
            })?,
            IdentityScheme::UserId => resolved.user_id.ok_or_else(|| {
                IdentityError::Unauthenticated("no user id found in profile".into())
            })?,
        };
        let identity =
            Identity::new(&raw).map_err(|e| IdentityError::Unauthenticated(e.to_string()))?;
        tracing::debug!(caller = %identity, scheme = self.scheme.as_str(), "authenticated caller");
        Ok(identity)
    }

    /// Map one signer reference to a canonical identity.
    pub async fn resolve_signer(&self, reference: &str) -> Result<Identity, IdentityError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(IdentityError::BadRequest("empty signer reference".into()));
        }
        if reference.len() > Identity::MAX_LEN {
            return Err(IdentityError::BadRequest(format!(
                "signer reference is {} bytes, at most {} allowed",
                reference.len(),
                Identity::MAX_LEN
            )));
        }
        let raw = match self.scheme {
            IdentityScheme::Wallet if Identity::looks_like_wallet(reference) => {
                reference.to_string()
            }
            IdentityScheme::Wallet => {
                let wallet = self.directory.resolve_wallet(reference).await?;
                if !Identity::looks_like_wallet(wallet.trim()) {
                    return Err(IdentityError::BadRequest(format!(
                        "user {reference} has malformed wallet address"
                    )));
                }
                wallet
            }
            IdentityScheme::UserId => reference.to_string(),
        };
        Identity::new(&raw).map_err(|e| IdentityError::BadRequest(e.to_string()))
    }

    /// Map every signer reference, in order. The first failure aborts.
    pub async fn resolve_signers(
        &self,
        references: &[String],
    ) -> Result<Vec<Identity>, IdentityError> {
        let mut signers = Vec::with_capacity(references.len());
        for reference in references {
            signers.push(self.resolve_signer(reference).await?);
        }
        Ok(signers)
    }
}
