use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comercio_core::{DomainError, DomainResult, UserId};

use crate::password::PasswordHash;
use crate::role::Role;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Validated registration input. The password here is still plaintext; hash
/// it before anything leaves this process boundary.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username is required"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if !self.email.contains('@') {
            return Err(DomainError::validation("email is malformed"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new_user() -> NewUser {
        NewUser {
            username: "maria".to_string(),
            email: "maria@example.com".to_string(),
            password: "hunter2".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(valid_new_user().validate().is_ok());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut missing_username = valid_new_user();
        missing_username.username = "  ".to_string();
        assert!(missing_username.validate().is_err());

        let mut missing_email = valid_new_user();
        missing_email.email = String::new();
        assert!(missing_email.validate().is_err());

        let mut missing_password = valid_new_user();
        missing_password.password = String::new();
        assert!(missing_password.validate().is_err());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut user = valid_new_user();
        user.email = "not-an-email".to_string();
        match user.validate().unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("email")),
            _ => panic!("expected Validation error"),
        }
    }
}
