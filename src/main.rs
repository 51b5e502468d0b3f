#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod config;
mod console_communication;
mod http_handler;
mod imaging;
mod keychain;
mod landing_control;
mod logger;

use crate::config::ServiceConfig;
use crate::console_communication::ConsoleEndpoint;
use crate::keychain::Keychain;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = ServiceConfig::from_env();
    info!(
        "Precision landing service, MAV2Rest at {}, settings in {}",
        config.mav2rest_url,
        config.settings_path.display()
    );
    let keychain = Keychain::new(&config)
        .await
        .unwrap_or_else(|e| fatal!("HTTP client could not be initialised: {e}"));

    keychain.con().auto_start().await;

    let endpoint = ConsoleEndpoint::start(&config.bind, keychain.con())
        .await
        .unwrap_or_else(|e| fatal!("Console endpoint could not bind {}: {e}", config.bind));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Shutdown signal unavailable ({e}), serving until killed");
        std::future::pending::<()>().await;
    }
    log!("Shutting down");
    keychain.controller().stop().await;
    drop(endpoint);
}
