use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use comercio_auth::TokenService;

use crate::app::errors;
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())
        .map_err(|msg| errors::json_error(StatusCode::UNAUTHORIZED, msg))?;

    let claims = state
        .tokens
        .verify(token, Utc::now())
        .map_err(|e| errors::json_error(StatusCode::UNAUTHORIZED, e.to_string()))?;

    req.extensions_mut().insert(CurrentUser {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
    });

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing bearer token")?;

    let header = header.to_str().map_err(|_| "missing bearer token")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("missing bearer token")?
        .trim();
    if token.is_empty() {
        return Err("missing bearer token");
    }

    Ok(token)
}
