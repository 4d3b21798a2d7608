use tracing::{error, info};

use chatzone::{ChatZone, Config};

#[tokio::main]
async fn main() {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = chatzone::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        chatzone::logging::init_console_only(&config.logging.level);
    }

    info!("{} - group chat engine", config.server.name);
    info!("Database: {}", config.database.path);

    let zone = match ChatZone::open(&config).await {
        Ok(zone) => zone,
        Err(e) => {
            error!("Failed to open storage: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "Bot {} (model {}, {})",
        if config.bot.enabled { "enabled" } else { "disabled" },
        config.bot.model,
        if config.bot.api_key.is_empty() { "offline" } else { "online" }
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }

    info!("Shutting down");
    zone.shutdown().await;
}
