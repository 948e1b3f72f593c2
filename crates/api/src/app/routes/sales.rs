use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use comercio_core::SaleId;
use comercio_sales::{SaleLineRequest, DEFAULT_PAYMENT_METHOD};
use comercio_store::{NewSale, SaleStore};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_sale).get(list_sales))
        .route("/:id", get(get_sale).delete(cancel_sale))
}

fn parse_id(raw: &str) -> Result<SaleId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

async fn create_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<dto::CreateSaleRequest>,
) -> axum::response::Response {
    let items: Vec<SaleLineRequest> = body
        .items
        .iter()
        .map(|item| SaleLineRequest {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();

    let new = NewSale {
        customer_id: body.customer_id,
        items,
        payment_method: body
            .payment_method
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        created_by: current.user_id,
    };

    match services.store.create_sale(new).await {
        Ok(sale) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "sale created",
                "sale": dto::sale_to_json(&sale),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::DateRangeParams>,
) -> axum::response::Response {
    match services
        .store
        .list_sales(params.range(), params.page_request())
        .await
    {
        Ok(page) => Json(dto::paginated_to_json(&page, dto::sale_summary_to_json)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn get_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.sale(id).await {
        Ok(Some(detail)) => Json(dto::sale_detail_to_json(&detail)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "sale not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn cancel_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.cancel_sale(id).await {
        Ok(()) => Json(json!({ "message": "sale cancelled" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
