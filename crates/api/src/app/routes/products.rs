use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use comercio_core::ProductId;
use comercio_store::ProductStore;

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/low-stock", get(low_stock_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

fn parse_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::ProductPayload>,
) -> axum::response::Response {
    match services.store.create_product(body.into_new_product()).await {
        Ok(product) => {
            (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListParams>,
) -> axum::response::Response {
    match services
        .store
        .list_products(params.search(), params.page_request())
        .await
    {
        Ok(page) => Json(dto::paginated_to_json(
            &page,
            dto::product_with_supplier_to_json,
        ))
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn low_stock_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.low_stock_products().await {
        Ok(products) => Json(json!(products
            .iter()
            .map(dto::product_to_json)
            .collect::<Vec<_>>()))
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.product(id).await {
        Ok(Some(row)) => Json(dto::product_with_supplier_to_json(&row)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ProductPayload>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .store
        .update_product(id, body.into_new_product())
        .await
    {
        Ok(product) => Json(dto::product_to_json(&product)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.delete_product(id).await {
        Ok(()) => Json(json!({ "message": "product deleted" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
