//! sandbox-vfs - Entry Point
//!
//! Opens the sandboxed storage root and serves an interactive shell on
//! stdin/stdout. The first argument, if any, names the configuration file.

use log::{error, info};
use tokio::io::BufReader;

use sandbox_vfs::config::{DEFAULT_CONFIG_PATH, VfsConfig};
use sandbox_vfs::shell::run_session;
use sandbox_vfs::utils::logging::setup_logging;
use sandbox_vfs::StorageManager;

#[tokio::main]
async fn main() {
    setup_logging();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match VfsConfig::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    info!("Opening storage root {}", config.storage_root);

    let manager = match StorageManager::open(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to open storage root: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = run_session(&manager, stdin, tokio::io::stdout()).await {
        error!("Shell session ended with an error: {}", e);
    }

    manager.shutdown().await;
    info!("Storage manager stopped");
}
