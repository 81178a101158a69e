use bakong_gateway_lib::{commands, modules};

#[tokio::main]
async fn main() {
    let config = match modules::config::load_gateway_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            println!("❌ Token renewal failed");
            std::process::exit(1);
        }
    };

    let log_guard = modules::logger::init_logger(&config.logging);
    let code = commands::run_renew_command(&config).await;

    // Flush file logs before exit skips destructors
    drop(log_guard);
    std::process::exit(code);
}
