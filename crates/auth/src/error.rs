use comercio_core::DomainError;
use thiserror::Error;

/// Authentication-layer error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user or wrong password. Deliberately indistinguishable so the
    /// endpoint does not leak which usernames exist.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The token failed signature or structural validation.
    #[error("invalid token")]
    InvalidToken,

    /// The token's validity window has passed.
    #[error("token has expired")]
    Expired,

    /// Hashing/signing machinery failed (not a caller mistake).
    #[error("credential processing failed")]
    Internal,
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        DomainError::unauthorized(err.to_string())
    }
}
