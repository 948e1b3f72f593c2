//! Password hashing.
//!
//! bcrypt with a fixed work factor; hashes are stored verbatim and verified
//! with constant-time comparison inside the bcrypt implementation.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Matches the work factor of the system this one replaces, so existing
/// hashes keep verifying.
const BCRYPT_COST: u32 = 10;

/// An already-hashed password. Never contains plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plaintext password.
    pub fn hash(plain: &str) -> Result<Self, AuthError> {
        let hash = bcrypt::hash(plain, BCRYPT_COST).map_err(|e| {
            tracing::error!("bcrypt hash failed: {e}");
            AuthError::Internal
        })?;
        Ok(Self(hash))
    }

    /// Wrap a hash loaded from storage.
    pub fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a plaintext password against this hash.
    pub fn verify(&self, plain: &str) -> Result<bool, AuthError> {
        bcrypt::verify(plain, &self.0).map_err(|e| {
            tracing::error!("bcrypt verify failed: {e}");
            AuthError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_matching_password_only() {
        let hash = PasswordHash::hash("s3cret").unwrap();
        assert!(hash.verify("s3cret").unwrap());
        assert!(!hash.verify("wrong").unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = PasswordHash::hash("s3cret").unwrap();
        let b = PasswordHash::hash("s3cret").unwrap();
        assert_ne!(a.as_str(), b.as_str());
    }
}
