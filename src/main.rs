use std::process::ExitCode;

use tracing::{error, info};

use sendnews::{Config, Exit};

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_or_default(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if let Err(e) = sendnews::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        sendnews::logging::init_console_only(&config.logging.level);
    }

    info!("SendNews - RSS to Telegram news relay");

    match sendnews::app::run(config).await {
        Ok(Exit::Shutdown) => ExitCode::SUCCESS,
        Ok(Exit::Restart) => match sendnews::lifecycle::restart_process() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Restart failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
