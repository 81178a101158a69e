// Extension points around the proxy flow. No-op unless file logging is on.

use axum::http::{header, HeaderMap, Method, StatusCode};

/// Log target routed to the proxy log file
pub const LOG_TARGET: &str = "proxy";

pub trait GatewayObserver: Send + Sync {
    fn on_request(&self, _method: &Method, _path: &str) {}

    fn on_upstream_call(&self, _method: &Method, _url: &str, _headers: &HeaderMap, _body: Option<&[u8]>) {}

    fn on_upstream_response(&self, _status: StatusCode, _body: &[u8]) {}

    fn on_html_normalized(&self, _upstream_status: StatusCode) {}

    fn on_error(&self, _stage: &str, _message: &str) {}
}

pub struct NoopObserver;

impl GatewayObserver for NoopObserver {}

/// Emits every extension point as a tracing event
pub struct TracingObserver;

impl GatewayObserver for TracingObserver {
    fn on_request(&self, method: &Method, path: &str) {
        tracing::debug!(target: LOG_TARGET, "INCOMING REQUEST: {} {}", method, path);
    }

    fn on_upstream_call(&self, method: &Method, url: &str, headers: &HeaderMap, body: Option<&[u8]>) {
        let header_list: Vec<String> = headers
            .iter()
            .map(|(name, value)| {
                if *name == header::AUTHORIZATION {
                    format!("{}: <redacted>", name)
                } else {
                    format!("{}: {}", name, value.to_str().unwrap_or("<binary>"))
                }
            })
            .collect();
        tracing::info!(
            target: LOG_TARGET,
            "OUTGOING REQUEST: {} {} headers={:?} body={}",
            method,
            url,
            header_list,
            body.map(String::from_utf8_lossy).unwrap_or_default()
        );
    }

    fn on_upstream_response(&self, status: StatusCode, body: &[u8]) {
        tracing::info!(
            target: LOG_TARGET,
            "BAKONG RESPONSE ({}): {}",
            status.as_u16(),
            String::from_utf8_lossy(body)
        );
    }

    fn on_html_normalized(&self, upstream_status: StatusCode) {
        tracing::warn!(
            target: LOG_TARGET,
            "HTML DETECTED (upstream {}) - Converting to JSON 404",
            upstream_status.as_u16()
        );
    }

    fn on_error(&self, stage: &str, message: &str) {
        tracing::error!(target: LOG_TARGET, "{}: {}", stage, message);
    }
}
