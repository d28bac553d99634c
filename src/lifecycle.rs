//! Server lifecycle management helpers.
//!
//! This module encapsulates the heavy lifting so `main.rs` stays a thin
//! orchestrator: building the engine client and executor, wiring the HTTP
//! server, and running it until shutdown.

use crate::config::ServerConfig;
use crate::middleware;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use treegate_api::handlers::AppState;
use treegate_api::{models, routes};
use treegate_core::engine::mysql::MysqlEngine;
use treegate_core::exec::QueryExecutor;

/// Aggregated application components shared across the HTTP workers.
pub struct ApplicationComponents {
    pub engine: Arc<MysqlEngine>,
    pub executor: Arc<QueryExecutor<MysqlEngine>>,
}

/// Build the engine client and the query executor.
pub async fn bootstrap(config: &ServerConfig) -> Result<ApplicationComponents> {
    let engine = Arc::new(
        MysqlEngine::new(&config.engine.url)
            .map_err(|e| anyhow::anyhow!("Failed to build engine client: {}", e))?,
    );
    info!("Engine client configured for {}", config.engine.url);

    let executor = Arc::new(QueryExecutor::new(engine.clone()));
    Ok(ApplicationComponents { engine, executor })
}

/// Start the HTTP server and run it until termination.
pub async fn run(config: &ServerConfig, components: ApplicationComponents) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);
    info!("Endpoints: POST /query, POST /export, GET /version");

    let executor = components.executor.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::request_logger())
            .wrap(middleware::cors())
            .app_data(web::JsonConfig::default().error_handler(models::json_error_handler))
            .app_data(web::Data::new(AppState { executor: executor.clone() }))
            .configure(routes::configure::<MysqlEngine>)
    });

    let server = server.bind(&bind_addr)?;

    let server = if config.server.workers > 0 {
        server.workers(config.server.workers)
    } else {
        server
    };

    server.run().await?;

    // Close the pooled engine connections before exiting.
    if let Err(err) = components.engine.disconnect().await {
        warn!("Failed to close engine connection pool: {}", err);
    }

    info!("Server shutdown complete");
    Ok(())
}
