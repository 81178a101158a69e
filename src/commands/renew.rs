// Process-level token renewal, for schedulers such as cron

use std::sync::Arc;

use crate::models::GatewayConfig;
use crate::modules::renewal::{RenewalError, RenewalSuccess, TokenRenewer, LOG_TARGET};
use crate::modules::token_store::FileTokenStore;

/// Line printed to stdout and exit code for a renewal outcome
pub fn report(result: &Result<RenewalSuccess, RenewalError>) -> (&'static str, i32) {
    match result {
        Ok(_) => ("✅ Token renewed successfully", 0),
        Err(e) if e.is_transport() => ("❌ CURL error", 1),
        Err(_) => ("❌ Token renewal failed", 1),
    }
}

/// Renew once against the configured token file and return the exit code
pub async fn run_renew_command(config: &GatewayConfig) -> i32 {
    let store = Arc::new(FileTokenStore::new(&config.token_file));
    let renewer = match TokenRenewer::new(config, store) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(target: LOG_TARGET, "Failed to prepare renewal: {}", e);
            println!("❌ Token renewal failed");
            return 1;
        }
    };

    let result = renewer.renew().await;
    let (message, code) = report(&result);
    println!("{}", message);
    code
}
