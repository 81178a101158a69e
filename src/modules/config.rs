use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::GatewayConfig;

const DATA_DIR: &str = ".bakong_gateway";
const CONFIG_FILE: &str = "gateway_config.json";
const CONFIG_PATH_ENV: &str = "BAKONG_GATEWAY_CONFIG";

/// Get data directory path
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Load gateway config: file (if any), then environment overrides, then path defaults
pub fn load_gateway_config() -> AppResult<GatewayConfig> {
    let data_dir = get_data_dir()?;
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir.join(CONFIG_FILE));

    let mut config = load_config_file(&config_path)?;
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    fill_path_defaults(&mut config, &data_dir);
    config.offset().map_err(AppError::Config)?;

    Ok(config)
}

/// Read a JSON config file. A missing file yields the defaults.
pub fn load_config_file(path: &Path) -> AppResult<GatewayConfig> {
    if !path.exists() {
        return Ok(GatewayConfig::default());
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
}

/// Apply `BAKONG_*` overrides through the given lookup
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BAKONG_GATEWAY_HOST") {
        config.host = v;
    }
    if let Some(v) = lookup("BAKONG_GATEWAY_PORT") {
        config.port = v
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid BAKONG_GATEWAY_PORT: {}", v)))?;
    }
    if let Some(v) = lookup("BAKONG_BASE_URL") {
        config.base_url = v;
    }
    if let Some(v) = lookup("BAKONG_TOKEN_FILE") {
        config.token_file = PathBuf::from(v);
    }
    if let Some(v) = lookup("BAKONG_EMAIL") {
        config.email = v;
    }
    if let Some(v) = lookup("BAKONG_CRON_KEY") {
        config.cron_key = v;
    }
    if let Some(v) = lookup("BAKONG_TIMEZONE") {
        config.timezone = v;
    }
    if let Some(v) = lookup("BAKONG_ENABLE_LOGS") {
        config.logging.enabled = parse_flag(&v)
            .ok_or_else(|| AppError::Config(format!("Invalid BAKONG_ENABLE_LOGS: {}", v)))?;
    }
    if let Some(v) = lookup("BAKONG_LOG_DIR") {
        config.logging.dir = PathBuf::from(v);
    }
    Ok(())
}

/// Resolve empty paths against the data directory
pub fn fill_path_defaults(config: &mut GatewayConfig, data_dir: &Path) {
    if config.token_file.as_os_str().is_empty() {
        config.token_file = data_dir.join("storage").join("token.json");
    }
    if config.logging.dir.as_os_str().is_empty() {
        config.logging.dir = data_dir.join("logs");
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
