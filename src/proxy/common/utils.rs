// Request/response shaping helpers for the forwarding handler

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use bytes::Bytes;
use serde_json::{Map, Value};

/// Markers that identify an HTML document in an upstream body
const HTML_MARKERS: [&str; 2] = ["<!DOCTYPE html>", "<html"];

/// Inbound headers that never travel upstream
const SKIPPED_HEADERS: [&str; 12] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
    "content-type",
    "accept-encoding",
];

/// Methods that carry a body upstream
pub fn method_carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// A non-empty raw body is forwarded verbatim; otherwise the query
/// parameters become a JSON body.
pub fn resolve_body(raw: &Bytes, query: Option<&str>) -> Bytes {
    if !raw.is_empty() {
        return raw.clone();
    }
    Bytes::from(query_to_json(query.unwrap_or("")))
}

/// Encode query parameters as a JSON object of strings (last value wins).
/// No parameters encode as `[]`, the upstream's historical empty body.
pub fn query_to_json(query: &str) -> String {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        map.insert(key.into_owned(), Value::String(value.into_owned()));
    }

    if map.is_empty() {
        return "[]".to_string();
    }
    Value::Object(map).to_string()
}

/// Headers for the upstream call: end-to-end inbound headers, a forced JSON
/// content type, and the bearer token unless the caller sent Authorization.
pub fn build_outbound_headers(
    inbound: &HeaderMap,
    access_token: &str,
) -> Result<HeaderMap, header::InvalidHeaderValue> {
    let connection_tokens: Vec<HeaderName> = inbound
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|t| HeaderName::from_bytes(t.trim().as_bytes()).ok())
        .collect();

    let mut headers = HeaderMap::new();
    for (name, value) in inbound.iter() {
        if SKIPPED_HEADERS.contains(&name.as_str()) || connection_tokens.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    if !inbound.contains_key(header::AUTHORIZATION) {
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access_token))?,
        );
    }

    Ok(headers)
}

/// Substring check for an HTML document. An upstream error page with any
/// status is caught by this too.
pub fn is_html_document(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    HTML_MARKERS.iter().any(|marker| text.contains(marker))
}
