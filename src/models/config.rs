use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Production Bakong OpenAPI host
pub const DEFAULT_BASE_URL: &str = "https://api-bakong.nbc.gov.kh";

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream base URL, without trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Location of the persisted token record
    #[serde(default)]
    pub token_file: PathBuf,

    /// Account email sent to the renew endpoint
    #[serde(default)]
    pub email: String,

    /// Shared secret for the HTTP renewal trigger. Empty disables the trigger.
    #[serde(default)]
    pub cron_key: String,

    /// Fixed UTC offset used when stamping renewals, e.g. "+07:00"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Renewal request timeout (seconds)
    #[serde(default = "default_renew_timeout")]
    pub renew_timeout_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// File logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write proxy and renewal events to files
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub dir: PathBuf,
    #[serde(default = "default_proxy_log")]
    pub proxy_file: String,
    #[serde(default = "default_renewal_log")]
    pub renewal_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::new(),
            proxy_file: default_proxy_log(),
            renewal_file: default_renewal_log(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            token_file: PathBuf::new(),
            email: String::new(),
            cron_key: String::new(),
            timezone: default_timezone(),
            renew_timeout_secs: default_renew_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timezone() -> String {
    // Asia/Phnom_Penh, which observes no DST
    "+07:00".to_string()
}

fn default_renew_timeout() -> u64 {
    30
}

fn default_proxy_log() -> String {
    "proxy.log".to_string()
}

fn default_renewal_log() -> String {
    "renew-token.log".to_string()
}

impl GatewayConfig {
    /// Upstream base URL with any trailing slash removed
    pub fn upstream_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Parsed timestamp offset
    pub fn offset(&self) -> Result<FixedOffset, String> {
        self.timezone
            .parse::<FixedOffset>()
            .map_err(|e| format!("Invalid timezone offset {:?}: {}", self.timezone, e))
    }
}
