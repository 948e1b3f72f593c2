use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use comercio_auth::{NewUser, PasswordHash};
use comercio_store::{RegisterUser, UserStore};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::RegisterRequest>,
) -> axum::response::Response {
    let new_user = NewUser {
        username: body.username,
        email: body.email,
        password: body.password,
        role: body.role.unwrap_or_default(),
    };
    if let Err(e) = new_user.validate() {
        return errors::domain_error_to_response(e);
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    let password = new_user.password.clone();
    let hash = match tokio::task::spawn_blocking(move || PasswordHash::hash(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            tracing::error!("password hashing failed: {e}");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
        Err(e) => {
            tracing::error!("hashing task failed: {e}");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    match services
        .store
        .create_user(RegisterUser {
            username: new_user.username,
            email: new_user.email,
            password_hash: hash,
            role: new_user.role,
        })
        .await
    {
        Ok(user) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "user created",
                "user": dto::user_to_json(&user),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LoginRequest>,
) -> axum::response::Response {
    if body.username.is_empty() || body.password.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "username and password are required");
    }

    let user = match services.store.user_by_username(&body.username).await {
        Ok(Some(user)) => user,
        Ok(None) => return errors::json_error(StatusCode::UNAUTHORIZED, "invalid credentials"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let hash = user.password_hash.clone();
    let password = body.password;
    let valid = match tokio::task::spawn_blocking(move || hash.verify(&password)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            tracing::error!("password verification failed: {e}");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
        Err(e) => {
            tracing::error!("verification task failed: {e}");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };
    if !valid {
        return errors::json_error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    let token = match services.tokens.issue(&user, Utc::now()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("token issuance failed: {e}");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    Json(json!({
        "message": "login successful",
        "token": token,
        "user": dto::user_to_json(&user),
    }))
    .into_response()
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.store.user_by_id(current.user_id).await {
        Ok(Some(user)) => Json(dto::user_to_json(&user)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "user not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
