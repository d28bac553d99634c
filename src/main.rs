// Treegate server entrypoint
//!
//! The heavy lifting (configuration, logging setup, server wiring) lives in
//! dedicated modules so this file remains a thin orchestrator.

mod config;
mod lifecycle;
mod logging;
mod middleware;

use anyhow::Result;
use config::ServerConfig;
use lifecycle::{bootstrap, run};
use log::info;
use std::path::Path;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (fallback to defaults when config file missing)
    let config_path = "config.toml";
    let config = if Path::new(config_path).exists() {
        match ServerConfig::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("FATAL: Failed to load {}: {}", config_path, e);
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("No {} found, using default configuration", config_path);
        let mut cfg = ServerConfig::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        cfg
    };

    // Logging before any other side effects
    logging::init_logging(
        &config.logging.level,
        &config.logging.file_path,
        config.logging.log_to_console,
    )?;

    info!("treegate-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Host: {}  Port: {}", config.server.host, config.server.port);

    // Build application state
    let components = bootstrap(&config).await?;

    // Run HTTP server until termination signal is received
    run(&config, components).await
}
