//! API routes configuration
//!
//! This module wires the gateway's HTTP routes to their handlers.

use crate::handlers;
use crate::models::Envelope;
use actix_web::{web, HttpResponse};
use serde_json::json;
use treegate_core::engine::Engine;

/// Configure the gateway routes:
/// - POST /query - Execute a SQL statement, rows as JSON
/// - POST /export - Execute a SQL statement, rows as a CSV attachment
/// - GET /version - Server version
pub fn configure<E: Engine>(cfg: &mut web::ServiceConfig) {
    cfg.route("/query", web::post().to(handlers::query::<E>))
        .route("/export", web::post().to(handlers::export::<E>))
        .route("/version", web::get().to(version_handler));
}

/// Version endpoint handler
async fn version_handler() -> HttpResponse {
    Envelope::data(json!({ "version": env!("CARGO_PKG_VERSION") })).into_response()
}
