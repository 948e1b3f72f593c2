use async_trait::async_trait;
use chrono::Utc;

use comercio_auth::User;
use comercio_core::{DomainError, UserId};

use crate::error::{is_unique_violation, StoreError, StoreResult};
use crate::interface::{RegisterUser, UserStore};

use super::{decode_failure, user_from_row, PgStore};

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new: RegisterUser) -> StoreResult<User> {
        let user = User {
            id: UserId::new(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict("user or email already exists").into()
            } else {
                StoreError::backend("create_user", e)
            }
        })?;

        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::backend("get_user_by_username", e))?;

        row.map(|row| user_from_row(&row).map_err(decode_failure))
            .transpose()
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::backend("get_user_by_id", e))?;

        row.map(|row| user_from_row(&row).map_err(decode_failure))
            .transpose()
    }
}
