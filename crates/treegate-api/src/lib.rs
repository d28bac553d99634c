// Treegate API Library
//
// REST layer for the gateway: HTTP handlers, routes, and the
// request/response envelope models.

pub mod handlers;
pub mod models;
pub mod routes;
