//! Server-wide middleware configuration helpers.
//!
//! Keeps the Actix application setup focused by providing reusable
//! constructors for the CORS and logging layers.

use actix_cors::Cors;
use actix_web::http::Method;
use actix_web::middleware;

/// Build the CORS middleware.
///
/// The gateway fronts a browser client served from an arbitrary origin, so
/// the policy is permissive: any origin, any header, the two methods the
/// routes answer to.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_header()
        .allowed_methods(vec![Method::GET, Method::POST])
        .max_age(3600)
}

/// Build the request logger middleware.
pub fn request_logger() -> middleware::Logger {
    middleware::Logger::default()
}
