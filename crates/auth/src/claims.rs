use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comercio_core::UserId;

use crate::error::AuthError;
use crate::role::Role;

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims the backend expects once a token has
/// been decoded/verified. Timestamps are unix seconds, as JWT convention
/// demands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Username at issue time (display/convenience only).
    pub username: String,

    /// Role granted to the subject.
    pub role: Role,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiration, unix seconds.
    pub exp: i64,
}

/// Deterministically validate a claim set's time window.
///
/// Note: this validates the *claims* only. Signature verification is the
/// token layer's job.
pub fn validate_window(claims: &Claims, now: DateTime<Utc>) -> Result<(), AuthError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(AuthError::InvalidToken);
    }
    if now < claims.iat {
        return Err(AuthError::InvalidToken);
    }
    if now >= claims.exp {
        return Err(AuthError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_at(iat: i64, exp: i64) -> Claims {
        Claims {
            sub: UserId::new(),
            username: "tester".to_string(),
            role: Role::User,
            iat,
            exp,
        }
    }

    #[test]
    fn window_accepts_current_token() {
        let now = Utc::now();
        let claims = claims_at(now.timestamp() - 60, now.timestamp() + 60);
        assert!(validate_window(&claims, now).is_ok());
    }

    #[test]
    fn window_rejects_expired_token() {
        let now = Utc::now();
        let claims = claims_at(now.timestamp() - 120, now.timestamp() - 60);
        assert_eq!(validate_window(&claims, now).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn window_rejects_inverted_or_future_tokens() {
        let now = Utc::now();

        let inverted = claims_at(now.timestamp() + 60, now.timestamp() - 60);
        assert_eq!(
            validate_window(&inverted, now).unwrap_err(),
            AuthError::InvalidToken
        );

        let future = claims_at(now.timestamp() + 60, now.timestamp() + 120);
        assert_eq!(
            validate_window(&future, now).unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
