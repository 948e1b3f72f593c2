use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use comercio_core::SupplierId;
use comercio_store::SupplierStore;

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

fn parse_id(raw: &str) -> Result<SupplierId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::PartyPayload>,
) -> axum::response::Response {
    match services
        .store
        .create_supplier(body.into_new_supplier())
        .await
    {
        Ok(supplier) => {
            (StatusCode::CREATED, Json(dto::supplier_to_json(&supplier))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    match services
        .store
        .list_suppliers(params.search(), params.page_request())
        .await
    {
        Ok(page) => Json(dto::paginated_to_json(&page, dto::supplier_to_json)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.supplier(id).await {
        Ok(Some(supplier)) => Json(dto::supplier_to_json(&supplier)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "supplier not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn update_supplier(
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
        .update_supplier(id, body.into_new_supplier())
        .await
    {
        Ok(supplier) => Json(dto::supplier_to_json(&supplier)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.delete_supplier(id).await {
        Ok(()) => Json(json!({ "message": "supplier deleted" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
