pub mod config;
pub mod token;

pub use config::{GatewayConfig, LoggingConfig};
pub use token::TokenRecord;
