// Token renewal against the upstream renew endpoint.
// Shared by the `renew-token` binary and the cron HTTP trigger.

use std::sync::Arc;

use chrono::{FixedOffset, SecondsFormat, Utc};
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::error::{AppError, AppResult};
use crate::models::GatewayConfig;
use crate::modules::token_store::TokenStore;

pub const RENEW_PATH: &str = "/v1/renew_token";

/// Log target routed to the renewal log file
pub const LOG_TARGET: &str = "renewal";

#[derive(Debug, Error)]
pub enum RenewalError {
    #[error("Renewal email is not configured")]
    MissingEmail,

    #[error("Renew request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Upstream returned HTTP {status}")]
    Status { status: u16, response: Option<Value> },

    #[error("Upstream response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("Upstream rejected the renewal")]
    Rejected { response: Value },

    #[error("Upstream response carries no token")]
    EmptyToken { response: Value },

    #[error("Failed to save renewed token: {0}")]
    Store(#[source] AppError),
}

impl RenewalError {
    /// DNS, TLS, connect, timeout or body read failure
    pub fn is_transport(&self) -> bool {
        matches!(self, RenewalError::Transport(_))
    }

    /// The upstream did answer, but not with a usable token
    pub fn is_upstream_contract(&self) -> bool {
        matches!(
            self,
            RenewalError::Status { .. }
                | RenewalError::MalformedJson(_)
                | RenewalError::Rejected { .. }
                | RenewalError::EmptyToken { .. }
        )
    }

    /// Decoded upstream payload, when there was one
    pub fn upstream_response(&self) -> Option<&Value> {
        match self {
            RenewalError::Status { response, .. } => response.as_ref(),
            RenewalError::Rejected { response } | RenewalError::EmptyToken { response } => {
                Some(response)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenewalSuccess {
    pub token: String,
    pub renewed_at: String,
}

/// Exchanges the configured account email for a fresh token and stores it
pub struct TokenRenewer {
    client: Client,
    endpoint: String,
    email: String,
    offset: FixedOffset,
    store: Arc<dyn TokenStore>,
}

impl TokenRenewer {
    pub fn new(config: &GatewayConfig, store: Arc<dyn TokenStore>) -> AppResult<Self> {
        let client = crate::utils::http::create_client(config.renew_timeout_secs)?;
        let offset = config.offset().map_err(AppError::Config)?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", config.upstream_base(), RENEW_PATH),
            email: config.email.clone(),
            offset,
            store,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current time in the configured offset, RFC 3339
    pub fn timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.offset)
            .to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    /// Run one renewal. The store is only written on full success.
    pub async fn renew(&self) -> Result<RenewalSuccess, RenewalError> {
        tracing::info!(target: LOG_TARGET, "--- Token renewal started ---");

        if self.email.trim().is_empty() {
            tracing::error!(target: LOG_TARGET, "Renewal email is not configured");
            return Err(RenewalError::MissingEmail);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&json!({ "email": self.email }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: LOG_TARGET, "CURL ERROR: {}", e);
                RenewalError::Transport(e)
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| {
            tracing::error!(target: LOG_TARGET, "CURL ERROR: {}", e);
            RenewalError::Transport(e)
        })?;

        tracing::info!(target: LOG_TARGET, "HTTP STATUS: {}", status.as_u16());
        tracing::info!(target: LOG_TARGET, "RAW RESPONSE: {}", raw);

        let token = extract_token(status, &raw).map_err(|e| {
            tracing::error!(target: LOG_TARGET, "Token renewal failed (invalid response): {}", e);
            e
        })?;

        let renewed_at = self.timestamp();
        self.store.write(&token, &renewed_at).map_err(|e| {
            tracing::error!(target: LOG_TARGET, "Failed to save renewed token: {}", e);
            RenewalError::Store(e)
        })?;

        tracing::info!(target: LOG_TARGET, "Token renewed successfully");
        Ok(RenewalSuccess { token, renewed_at })
    }
}

/// Validate a renew response: HTTP 200, integer `responseCode == 0`,
/// non-empty string `data.token`.
pub fn extract_token(status: StatusCode, raw: &str) -> Result<String, RenewalError> {
    let parsed = serde_json::from_str::<Value>(raw);

    if status != StatusCode::OK {
        return Err(RenewalError::Status {
            status: status.as_u16(),
            response: parsed.ok(),
        });
    }

    let data = parsed.map_err(|e| RenewalError::MalformedJson(e.to_string()))?;

    if data.get("responseCode").and_then(Value::as_i64) != Some(0) {
        return Err(RenewalError::Rejected { response: data });
    }

    match data["data"]["token"].as_str() {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(RenewalError::EmptyToken { response: data }),
    }
}
