use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use comercio_core::DomainError;
use comercio_store::StoreError;

/// The error payload shape of this API: `{"error": <message>}`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_)
        | DomainError::InvalidId(_)
        | DomainError::BusinessRule(_)
        | DomainError::Conflict(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
    };
    json_error(status, err.to_string())
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Decode(msg) => {
            tracing::error!("corrupt row: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
        StoreError::Backend { operation, source } => {
            tracing::error!(operation, error = %source, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}
