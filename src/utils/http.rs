use reqwest::Client;
use std::time::Duration;

use crate::error::AppResult;

/// Create the client used for the renew call.
/// TLS certificate and hostname verification stay at reqwest's defaults (on).
pub fn create_client(timeout_secs: u64) -> AppResult<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Create the client used for proxied calls: no overall timeout, and no idle
/// pooling so every forwarded request opens and closes its own connection.
pub fn create_forward_client() -> AppResult<Client> {
    let client = Client::builder().pool_max_idle_per_host(0).build()?;
    Ok(client)
}
