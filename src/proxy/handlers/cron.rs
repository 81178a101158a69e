// HTTP-triggered token renewal
use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::modules::renewal::{RenewalError, LOG_TARGET};
use crate::proxy::server::AppState;

/// GET /bakong/renew/cron?key=<secret>
pub async fn handle_renew_cron(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !key_matches(&state.cron_key, params.get("key").map(String::as_str)) {
        tracing::warn!(target: LOG_TARGET, "Rejected cron renewal: invalid or missing key");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "status": "error",
                "message": "Invalid or missing cron key"
            })),
        )
            .into_response();
    }

    match state.renewer.renew().await {
        Ok(success) => {
            tracing::info!(target: LOG_TARGET, "CRON RENEWAL SUCCESS");
            Json(json!({
                "status": "success",
                "message": "Token renewed successfully",
                "renewed_at": success.renewed_at
            }))
            .into_response()
        }
        Err(e) => {
            let (status, body) = renewal_error_response(&e);
            (status, Json(body)).into_response()
        }
    }
}

/// An empty configured key never matches
fn key_matches(configured: &str, supplied: Option<&str>) -> bool {
    match supplied {
        Some(key) => !configured.is_empty() && key == configured,
        None => false,
    }
}

/// Status and JSON body reported to the cron caller for a failed renewal
pub fn renewal_error_response(error: &RenewalError) -> (StatusCode, Value) {
    match error {
        RenewalError::Transport(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "error",
                "message": "Curl error during renewal",
                "error": e.to_string()
            }),
        ),
        RenewalError::MissingEmail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "error",
                "message": "Renewal email is not configured"
            }),
        ),
        RenewalError::Store(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "status": "error",
                "message": "Failed to save renewed token",
                "error": e.to_string()
            }),
        ),
        RenewalError::Status { .. }
        | RenewalError::MalformedJson(_)
        | RenewalError::Rejected { .. }
        | RenewalError::EmptyToken { .. } => (
            StatusCode::BAD_GATEWAY,
            json!({
                "status": "error",
                "message": "Failed to renew token from Bakong",
                "bakong_response": error.upstream_response().cloned().unwrap_or(Value::Null)
            }),
        ),
    }
}
