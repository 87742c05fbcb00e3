use thiserror::Error;

/// Failures raised by the authentication core.
///
/// All of these are recovered at the request boundary: handlers log and
/// answer with a redirect, never a crash.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Local registration hit the unique index on `username`.
    #[error("username already taken")]
    DuplicateUsername,
    /// Unknown username or wrong password. Callers must surface both the
    /// same way so responses cannot be used to enumerate accounts.
    #[error("invalid username or password")]
    InvalidCredential,
    /// The provider handed back an empty or unusable subject.
    #[error("provider identity missing or malformed")]
    ProviderIdentityInvalid,
    /// Any failure in the authorize/token/profile round trip.
    #[error("provider round trip failed: {0}")]
    ProviderRoundTrip(String),
    #[error("credential hashing failed: {0}")]
    Hashing(String),
    #[error("session store unavailable: {0}")]
    SessionStore(#[from] tower_sessions::session::Error),
    #[error(transparent)]
    Persistence(#[from] sea_orm::DbErr),
}

impl AuthError {
    /// True when the caller's credentials were the problem rather than the
    /// system. Drives the log level at the request boundary.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            AuthError::DuplicateUsername
                | AuthError::InvalidCredential
                | AuthError::ProviderIdentityInvalid
        )
    }
}
