// Catch-all forwarding handler
use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde_json::json;

use crate::proxy::common::utils::{
    build_outbound_headers, is_html_document, method_carries_body, resolve_body,
};
use crate::proxy::server::AppState;
use crate::proxy::upstream::{OutboundRequest, UpstreamResponse};

const FORWARDED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Forward any unmatched request to the upstream with the cached token
pub async fn handle_forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !FORWARDED_METHODS.contains(&method) {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({
                "responseCode": 1,
                "responseMessage": "Method Not Allowed"
            })),
        )
            .into_response();
    }

    let observer = state.observer.clone();
    observer.on_request(&method, uri.path());

    // 1. Token check, before any upstream traffic
    let access_token = match state.token_store.read() {
        Some(token) => token,
        None => {
            observer.on_error("TOKEN", "Access token missing");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "responseCode": 1,
                    "responseMessage": "Access token not available. Please renew token."
                })),
            )
                .into_response();
        }
    };

    // 2. Body and headers
    let body = resolve_body(&body, uri.query());
    let outbound_headers = match build_outbound_headers(&headers, &access_token) {
        Ok(h) => h,
        Err(e) => {
            observer.on_error("HEADERS", &e.to_string());
            return gateway_error(&format!("Invalid stored access token: {}", e));
        }
    };

    let request = OutboundRequest {
        body: method_carries_body(&method).then_some(body),
        method,
        path: uri.path().to_string(),
        headers: outbound_headers,
    };

    observer.on_upstream_call(
        &request.method,
        &state.upstream.build_url(&request.path),
        &request.headers,
        request.body.as_deref(),
    );

    // 3. Upstream call, no retry
    let upstream = match state.upstream.forward(request).await {
        Ok(r) => r,
        Err(e) => {
            observer.on_error("CURL ERROR", &e.to_string());
            return gateway_error(&e.to_string());
        }
    };

    observer.on_upstream_response(upstream.status, &upstream.body);

    // 4. Response normalization
    if is_html_document(&upstream.body) {
        observer.on_html_normalized(upstream.status);
        return not_found();
    }

    relay(upstream)
}

fn relay(upstream: UpstreamResponse) -> Response {
    (
        upstream.status,
        [(header::CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response()
}

fn gateway_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "responseCode": 1,
            "responseMessage": "Gateway Error",
            "error": message
        })),
    )
        .into_response()
}

/// Fixed reply for HTML upstream bodies, whatever their real status
fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "responseCode": 1,
            "responseMessage": "Not Found",
            "errorCode": 404,
            "data": null
        })),
    )
        .into_response()
}
