use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use comercio_core::CustomerId;
use comercio_store::CustomerStore;

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

fn parse_id(raw: &str) -> Result<CustomerId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::PartyPayload>,
) -> axum::response::Response {
    match services
        .store
        .create_customer(body.into_new_customer())
        .await
    {
        Ok(customer) => {
            (StatusCode::CREATED, Json(dto::customer_to_json(&customer))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    match services
        .store
        .list_customers(params.search(), params.page_request())
        .await
    {
        Ok(page) => Json(dto::paginated_to_json(&page, dto::customer_to_json)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.customer(id).await {
        Ok(Some(customer)) => Json(dto::customer_to_json(&customer)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "customer not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::PartyPayload>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .store
        .update_customer(id, body.into_new_customer())
        .await
    {
        Ok(customer) => Json(dto::customer_to_json(&customer)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.delete_customer(id).await {
        Ok(()) => Json(json!({ "message": "customer deleted" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
