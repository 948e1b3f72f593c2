use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

use comercio_core::PurchaseId;
use comercio_purchasing::PurchaseLineRequest;
use comercio_store::{NewPurchase, PurchaseStore};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_purchase).get(list_purchases))
        .route("/:id", get(get_purchase).delete(cancel_purchase))
        .route("/:id/status", patch(update_purchase_status))
}

fn parse_id(raw: &str) -> Result<PurchaseId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

async fn create_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(body): ApiJson<dto::CreatePurchaseRequest>,
) -> axum::response::Response {
    let items: Vec<PurchaseLineRequest> = body
        .items
        .iter()
        .map(|item| PurchaseLineRequest {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();

    let new = NewPurchase {
        supplier_id: body.supplier_id,
        items,
        expected_delivery: body.expected_delivery,
        created_by: current.user_id,
    };

    match services.store.create_purchase(new).await {
        Ok(purchase) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "purchase created",
                "purchase": dto::purchase_to_json(&purchase),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn list_purchases(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::DateRangeParams>,
) -> axum::response::Response {
    match services
        .store
        .list_purchases(params.range(), params.page_request())
        .await
    {
        Ok(page) => {
            Json(dto::paginated_to_json(&page, dto::purchase_summary_to_json)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn get_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.purchase(id).await {
        Ok(Some(detail)) => Json(dto::purchase_detail_to_json(&detail)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "purchase not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn update_purchase_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::UpdatePurchaseStatusRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services
        .store
        .update_purchase_status(id, body.status)
        .await
    {
        Ok(purchase) => Json(dto::purchase_to_json(&purchase)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn cancel_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.cancel_purchase(id).await {
        Ok(()) => Json(json!({ "message": "purchase cancelled" })).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
