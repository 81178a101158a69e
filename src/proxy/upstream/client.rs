// Upstream client for the Bakong OpenAPI

use axum::http::{header, HeaderMap, Method, StatusCode};
use bytes::Bytes;
use reqwest::Client;

use crate::error::AppResult;

/// One proxied call, derived from an inbound request
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Inbound path, starting with `/`
    pub path: String,
    pub headers: HeaderMap,
    /// Attached only for POST/PUT/PATCH
    pub body: Option<Bytes>,
}

/// Fully read upstream reply
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str) -> AppResult<Self> {
        Ok(Self {
            http_client: crate::utils::http::create_forward_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map an inbound path onto the upstream host
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one request upstream and read the whole body.
    /// No retries; any transport or body-read failure is returned as is.
    pub async fn forward(&self, request: OutboundRequest) -> Result<UpstreamResponse, reqwest::Error> {
        let url = self.build_url(&request.path);

        let mut builder = self
            .http_client
            .request(request.method, &url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let client = UpstreamClient::new("https://api-bakong.nbc.gov.kh/").unwrap();
        assert_eq!(
            client.build_url("/v1/check_transaction_by_md5"),
            "https://api-bakong.nbc.gov.kh/v1/check_transaction_by_md5"
        );
        assert_eq!(client.build_url("/"), "https://api-bakong.nbc.gov.kh/");
        assert_eq!(
            client.build_url("v1/renew_token"),
            "https://api-bakong.nbc.gov.kh/v1/renew_token"
        );
    }
}
