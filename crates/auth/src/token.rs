//! HS256 token issuance and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{validate_window, Claims};
use crate::error::AuthError;
use crate::user::User;

/// Issues and verifies bearer tokens for the HTTP surface.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for `user` valid from `now` for the configured TTL.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| {
                tracing::error!("token encoding failed: {e}");
                AuthError::Internal
            },
        )
    }

    /// Verify signature and validity window, returning the claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        // The window is validated deterministically against the caller's
        // clock below, not against the decoder's system clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        validate_window(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use comercio_core::UserId;

    fn test_user() -> User {
        User {
            id: UserId::new(),
            username: "tester".to_string(),
            email: "tester@example.com".to_string(),
            password_hash: crate::PasswordHash::from_stored("x".to_string()),
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let svc = TokenService::new(b"test-secret", 8);
        let user = test_user();
        let now = Utc::now();

        let token = svc.issue(&user, now).unwrap();
        let claims = svc.verify(&token, now).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let svc = TokenService::new(b"test-secret", 1);
        let user = test_user();
        let issued = Utc::now();

        let token = svc.issue(&user, issued).unwrap();
        let err = svc.verify(&token, issued + Duration::hours(2)).unwrap_err();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let issuer = TokenService::new(b"secret-a", 8);
        let verifier = TokenService::new(b"secret-b", 8);
        let now = Utc::now();

        let token = issuer.issue(&test_user(), now).unwrap();
        assert_eq!(
            verifier.verify(&token, now).unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
