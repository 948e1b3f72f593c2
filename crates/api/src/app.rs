//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: injected service bundle (store + token service)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: the single error → status/payload mapping
//! - `extract.rs`: JSON extractor with this API's rejection shape

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;

use comercio_auth::TokenService;
use comercio_store::Store;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(store: Arc<dyn Store>, jwt_secret: &str, token_ttl_hours: i64) -> Router {
    let tokens = Arc::new(TokenService::new(jwt_secret.as_bytes(), token_ttl_hours));
    let services = Arc::new(AppServices::new(store, tokens.clone()));
    let auth_state = middleware::AuthState { tokens };

    // Register and login are the only routes reachable without a token.
    let public = Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .layer(Extension(services.clone()));

    let protected = Router::new()
        .route("/api/auth/profile", get(routes::auth::profile))
        .nest("/api/products", routes::products::router())
        .nest("/api/customers", routes::customers::router())
        .nest("/api/suppliers", routes::suppliers::router())
        .nest("/api/sales", routes::sales::router())
        .nest("/api/purchases", routes::purchases::router())
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(public)
        .merge(protected)
        .layer(ServiceBuilder::new())
}
