use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token was refused or the profile carries no usable identity.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The auth service could not be reached or failed.
    #[error("identity service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The wallet directory has no entry for this user.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("bad identity reference: {0}")]
    BadRequest(String),
}
