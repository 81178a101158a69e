// Root status endpoint
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// GET /
pub async fn handle_status() -> Response {
    let body = json!({
        "status": "ok",
        "message": "Bakong OpenAPI Auto Gateway",
        "example": "/v1/check_transaction_by_md5"
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string()),
    )
        .into_response()
}
